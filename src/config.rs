use chrono::{Duration, FixedOffset};
use clap::Parser;
use std::path::PathBuf;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "ip-tally")]
#[command(about = "Records submitted IPv4 addresses and counts unique vs duplicate submissions")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // JSON file holding the record set
    #[arg(short, long, env = "IP_TALLY_DATA_FILE", default_value = "data/ips.json")]
    pub data_file: PathBuf,

    // Keep everything in memory (nothing survives a restart)
    #[arg(long, env = "IP_TALLY_IN_MEMORY", default_value_t = false)]
    pub in_memory: bool,

    // Days a record lives before it is purged
    #[arg(short, long, env = "IP_TALLY_RETENTION_DAYS", default_value_t = 30)]
    pub retention_days: u32,

    // Local hour (0-23) at which duplicate counters are cleared
    #[arg(long, env = "IP_TALLY_RESET_HOUR", default_value_t = 6,
          value_parser = clap::value_parser!(u32).range(0..24))]
    pub reset_hour: u32,

    // Offset of the reset time zone from UTC, in minutes (default UTC+05:00)
    #[arg(long, env = "IP_TALLY_UTC_OFFSET_MINUTES", default_value_t = 300,
          allow_hyphen_values = true)]
    pub utc_offset_minutes: i32,

    // Background sweep interval in seconds, 0 disables it
    #[arg(long, env = "IP_TALLY_SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    // Debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    pub fn reset_offset(&self) -> anyhow::Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {} minutes", self.utc_offset_minutes))
    }

    pub fn sweep_period(&self) -> Option<std::time::Duration> {
        (self.sweep_interval > 0).then(|| std::time::Duration::from_secs(self.sweep_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let args = Args::parse_from(["ip-tally"]);
        assert_eq!(args.port, 3000);
        assert_eq!(args.retention(), Duration::days(30));
        assert_eq!(args.reset_hour, 6);
        assert_eq!(args.reset_offset().unwrap(), FixedOffset::east_opt(5 * 3600).unwrap());
        assert_eq!(args.sweep_period(), Some(std::time::Duration::from_secs(300)));
    }

    #[test]
    fn rejects_reset_hour_out_of_range() {
        assert!(Args::try_parse_from(["ip-tally", "--reset-hour", "24"]).is_err());
    }

    #[test]
    fn negative_offset_and_disabled_sweeper() {
        let args = Args::parse_from([
            "ip-tally",
            "--utc-offset-minutes",
            "-330",
            "--sweep-interval",
            "0",
        ]);
        assert_eq!(args.reset_offset().unwrap().local_minus_utc(), -330 * 60);
        assert_eq!(args.sweep_period(), None);
    }

    #[test]
    fn offset_beyond_a_day_is_an_error() {
        let args = Args::parse_from(["ip-tally", "--utc-offset-minutes", "1500"]);
        assert!(args.reset_offset().is_err());
    }
}
