use clap::Args;
use hiit_core::{Config, Preset, Settings, ValidationError};

pub mod config;
pub mod history;
pub mod plan;
pub mod run;
pub mod timer;

/// Workout selection shared by `run`, `plan` and `timer start`.
#[derive(Args, Debug, Default, Clone)]
pub struct WorkoutArgs {
    /// Start from a built-in preset (tabata, classic, sprint)
    #[arg(long)]
    pub preset: Option<String>,
    /// Work phase length in seconds
    #[arg(long)]
    pub work: Option<u64>,
    /// Rest phase length in seconds
    #[arg(long)]
    pub rest: Option<u64>,
    /// Prepare phase length in seconds
    #[arg(long)]
    pub prepare: Option<u64>,
    /// Number of work/rest cycles
    #[arg(long)]
    pub cycles: Option<u32>,
}

impl WorkoutArgs {
    pub fn is_empty(&self) -> bool {
        self.preset.is_none()
            && self.work.is_none()
            && self.rest.is_none()
            && self.prepare.is_none()
            && self.cycles.is_none()
    }

    /// Preset (or configured default) with per-field overrides applied.
    pub fn resolve(&self, config: &Config) -> Result<Settings, ValidationError> {
        let base = match &self.preset {
            Some(name) => name.parse::<Preset>()?.settings(),
            None => config.settings()?,
        };
        Settings::new(
            self.work.unwrap_or(base.work_secs),
            self.rest.unwrap_or(base.rest_secs),
            self.prepare.unwrap_or(base.prepare_secs),
            self.cycles.unwrap_or(base.cycles),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_use_config() {
        let config = Config::default();
        let settings = WorkoutArgs::default().resolve(&config).unwrap();
        assert_eq!(settings, config.settings().unwrap());
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let args = WorkoutArgs {
            preset: Some("tabata".into()),
            cycles: Some(4),
            ..Default::default()
        };
        let settings = args.resolve(&Config::default()).unwrap();
        assert_eq!(settings.work_secs, 20);
        assert_eq!(settings.cycles, 4);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = WorkoutArgs {
            work: Some(0),
            ..Default::default()
        };
        assert!(args.resolve(&Config::default()).is_err());
    }
}
