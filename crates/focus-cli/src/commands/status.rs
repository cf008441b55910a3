use anyhow::Result;

use super::render_view;
use crate::app::App;

pub fn show(app: &App, user: Option<&str>, task: Option<&str>) -> Result<()> {
    let page = app.attach(app.page_context(user, task))?;
    println!("{}", render_view(&page.view()));
    Ok(())
}
