//! WebDriver session handling and the per-page fetch pipeline.

pub mod capture;
pub mod page;
pub mod session;

pub use page::fetch_page;
pub use session::BrowserSession;
