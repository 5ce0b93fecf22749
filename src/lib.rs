#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod scene;
pub mod theme;
pub mod timeline;
pub mod verify;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{AnimationConfig, Config, LayoutConfig, load_config};
pub use error::{SceneError, VerifyError};
pub use layout::compute_layout;
pub use render::{Generated, generate, render_svg};
pub use scene::Scene;
pub use theme::Theme;
pub use timeline::build_timeline;
pub use verify::{Expectations, VerifyReport, verify_svg};
