use lumenscroll::config::SceneConfig;
use lumenscroll::error::ViewerError;
use lumenscroll::presets;
use lumenscroll::viewer::Viewer;

/// `lumenscroll [scene.toml | dna]`
///
/// Without an argument the built-in portfolio scene plays.
fn main() -> Result<(), ViewerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = match std::env::args().nth(1).as_deref() {
        None | Some("portfolio") => presets::portfolio(),
        Some("dna") => presets::dna(),
        Some(path) => SceneConfig::load(path)?,
    };

    Viewer::new(scene).run()
}
