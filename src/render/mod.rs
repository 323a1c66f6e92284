pub mod chart;
pub mod export;
pub mod html;

pub use export::works_csv;
pub use html::{render_page, PageInput};
