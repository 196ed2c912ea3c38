//! Browser automation primitives
//!
//! - `traits`: the `BrowserSession` / `SessionLauncher` seam
//! - `locator`: element locators and priority-ordered resolution chains
//! - `webdriver`: W3C WebDriver client (chromedriver)
//! - `mock`: scripted in-memory UI for tests

pub mod locator;
pub mod mock;
pub mod traits;
pub mod webdriver;

pub use locator::{Locator, LocatorChain, Pick, Requirement, Resolution};
pub use mock::{Interaction, MockBrowser, MockLauncher, MockUi};
pub use traits::{BrowserSession, ElementRef, Key, SessionLauncher};
pub use webdriver::{WebDriverLauncher, WebDriverSession};
