use crate::config::TourConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    manifest: Option<String>,
    zone: Option<String>,
    max_frames: Option<u32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --manifest/--zone/--max-frames with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "manifest" => overrides.manifest = Some(value),
                "zone" => overrides.zone = Some(value),
                "max-frames" => {
                    overrides.max_frames = Some(
                        value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?,
                    );
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: --manifest, --zone, --max-frames."),
            }
        }
        Ok(overrides)
    }

    pub fn manifest_path(&self) -> Option<&str> {
        self.manifest.as_deref()
    }

    pub fn into_config_overrides(self) -> TourConfigOverrides {
        TourConfigOverrides { zone: self.zone, max_frames: self.max_frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_flags() {
        let overrides = CliOverrides::parse(["tour", "--zone", "zone2", "--max-frames", "120"])
            .expect("flags parse");
        assert_eq!(overrides.zone.as_deref(), Some("zone2"));
        assert_eq!(overrides.max_frames, Some(120));
        assert!(overrides.manifest.is_none());
    }

    #[test]
    fn rejects_unknown_flags_and_bad_values() {
        assert!(CliOverrides::parse(["tour", "--speed", "2"]).is_err());
        assert!(CliOverrides::parse(["tour", "--max-frames", "lots"]).is_err());
        assert!(CliOverrides::parse(["tour", "zone2"]).is_err());
    }
}
