use anyhow::Result;
use clap::Parser;

use beatscope::logging::{self, LogTarget};

fn main() -> Result<()> {
    let cfg = beatscope::config::Config::parse();
    logging::init(LogTarget::for_run(cfg.log_file.as_deref(), cfg.is_listing()))?;

    if cfg.list_devices {
        beatscope::audio::list_input_devices()?;
        return Ok(());
    }
    if cfg.list_scenes {
        beatscope::app::print_scene_list();
        return Ok(());
    }

    beatscope::app::run(cfg)
}
