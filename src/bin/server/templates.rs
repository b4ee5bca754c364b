use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub(crate) struct Index {
    pub(crate) title: String,
    pub(crate) model_name: String,
    pub(crate) column: String,
    pub(crate) warning: Option<String>,
}
