//! Mode command - show the resolved test mode and where it came from

use crate::config::Config;
use crate::error::RewindResult;
use crate::mode::{RecordMode, ENV_TEST_MODE};
use console::style;

/// Where the effective mode was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeSource {
    Env,
    Config,
    Default,
}

/// Execute the mode command
pub async fn execute(config: &Config) -> RewindResult<()> {
    let (mode, source) = resolve(RecordMode::from_env()?, config);

    let origin = match source {
        ModeSource::Env => format!("from {}", ENV_TEST_MODE),
        ModeSource::Config => "from recording.mode".to_string(),
        ModeSource::Default => "default".to_string(),
    };
    let styled = match mode {
        RecordMode::Live => style(mode.as_str()).green(),
        RecordMode::Record => style(mode.as_str()).yellow(),
        RecordMode::Replay => style(mode.as_str()).cyan(),
    };

    println!("{} {}", styled.bold(), style(format!("({})", origin)).dim());
    Ok(())
}

fn resolve(env: Option<RecordMode>, config: &Config) -> (RecordMode, ModeSource) {
    match (env, config.recording.mode) {
        (Some(mode), _) => (mode, ModeSource::Env),
        (None, Some(mode)) => (mode, ModeSource::Config),
        (None, None) => (RecordMode::default(), ModeSource::Default),
    }
}
