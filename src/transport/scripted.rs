//! Scripted transport: canned diagnostics in place of real remote execution.
//!
//! Common diagnostic commands map to fixed payloads, independent of the
//! target host. Anything else yields a synthetic success payload, with a
//! small fixed probability of synthetic failure so the failure-handling path
//! is exercised end to end. Latency is drawn uniformly from a bounded range.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rand::Rng;

use super::{CommandOutput, Transport};

/// Default latency bounds, matching the original console's simulation
const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(3500);

/// Default probability that an unmatched command fails
const DEFAULT_FAILURE_RATE: f64 = 0.1;

const UNAME_OUTPUT: &str = "Linux demo-server 5.15.0-91-generic #101-Ubuntu SMP Tue Nov 14 13:52:09 UTC 2023 x86_64 x86_64 x86_64 GNU/Linux";

const DF_OUTPUT: &str = "\
Filesystem      Size  Used Avail Use% Mounted on
/dev/sda1        50G   15G   33G  32% /
/dev/sdb1       200G   80G  110G  43% /data
tmpfs           7.8G     0  7.8G   0% /dev/shm";

const FREE_OUTPUT: &str = "\
              total        used        free      shared  buff/cache   available
Mem:           15.6G       2.1G       10.2G       123M       3.3G       12.8G
Swap:          2.0G          0B       2.0G";

const SYSTEMCTL_OUTPUT: &str = "\
UNIT                           LOAD   ACTIVE SUB     DESCRIPTION
ssh.service                     loaded active running OpenSSH SSH daemon
nginx.service                   loaded active running A high performance web server
mysql.service                   loaded active running MySQL Community Server
docker.service                  loaded active running Docker Application Container Engine";

const PS_OUTPUT: &str = "\
USER         PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND
root           1  0.0  0.2  16856 10736 ?        Ss   10:00   0:01 /sbin/init
root         234  0.0  0.1  16920  9044 ?        Ss   10:00   0:00 /lib/systemd/systemd-journald
root         567  0.0  0.3  72128 23456 ?        Ssl  10:00   0:02 /usr/sbin/sshd -D";

/// Transport that generates scripted output instead of reaching a host
pub struct ScriptedTransport {
    min_delay: Duration,
    max_delay: Duration,
    failure_rate: f64,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Create a transport with the default latency range and failure rate
    pub fn new() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            failure_rate: DEFAULT_FAILURE_RATE,
        }
    }

    /// Create a transport with explicit timing and failure settings
    pub fn with_timing(min_delay: Duration, max_delay: Duration, failure_rate: f64) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    /// Zero latency, zero synthetic failure. Keeps tests deterministic.
    pub fn instant() -> Self {
        Self::with_timing(Duration::ZERO, Duration::ZERO, 0.0)
    }

    /// Fixed payload for a recognized diagnostic command, if any
    fn canned_output(command: &str) -> Option<&'static str> {
        if command.contains("uname") {
            Some(UNAME_OUTPUT)
        } else if command.contains("df") {
            Some(DF_OUTPUT)
        } else if command.contains("free") {
            Some(FREE_OUTPUT)
        } else if command.contains("systemctl") {
            Some(SYSTEMCTL_OUTPUT)
        } else if command.contains("ps") {
            Some(PS_OUTPUT)
        } else {
            None
        }
    }

    fn sample_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let span = (self.max_delay - self.min_delay).as_millis() as u64;
        let extra = rand::thread_rng().gen_range(0..=span);
        self.min_delay + Duration::from_millis(extra)
    }

    fn sample_failure(&self) -> bool {
        self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        // Sample before the await point; thread_rng is not held across it
        let delay = self.sample_delay();
        let fail = self.sample_failure();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(canned) = Self::canned_output(command) {
            return Ok(CommandOutput::success(canned));
        }

        if fail {
            return Ok(CommandOutput::failed(format!(
                "Command failed: {}\nError: Command not found or permission denied",
                command
            )));
        }

        Ok(CommandOutput::success(format!(
            "Command executed successfully: {}\nOutput generated at {}\nThis is a simulated output for demonstration purposes.",
            command,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Outcome;

    #[tokio::test]
    async fn test_canned_patterns_are_deterministic() {
        let transport = ScriptedTransport::instant();

        for _ in 0..3 {
            let result = transport.execute("uname -a").await.unwrap();
            assert_eq!(result.outcome, Outcome::Success);
            assert!(result.output.starts_with("Linux"));
        }

        let df = transport.execute("df -h").await.unwrap();
        assert!(df.output.starts_with("Filesystem"));

        let free = transport.execute("free -m").await.unwrap();
        assert!(free.output.contains("Mem:"));

        let services = transport.execute("systemctl list-units").await.unwrap();
        assert!(services.output.contains("nginx.service"));

        let procs = transport.execute("ps aux").await.unwrap();
        assert!(procs.output.contains("/sbin/init"));
    }

    #[tokio::test]
    async fn test_unmatched_command_succeeds_without_failure_rate() {
        let transport = ScriptedTransport::instant();
        let result = transport.execute("ls -la /var/log").await.unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert!(result.output.contains("ls -la /var/log"));
        assert!(result.output.contains("Output generated at"));
    }

    #[tokio::test]
    async fn test_forced_failure() {
        let transport = ScriptedTransport::with_timing(Duration::ZERO, Duration::ZERO, 1.0);
        let result = transport.execute("echo hello").await.unwrap();

        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.output.starts_with("Command failed: echo hello"));
    }

    #[tokio::test]
    async fn test_canned_patterns_never_fail() {
        // Pattern rules win over the synthetic failure roll
        let transport = ScriptedTransport::with_timing(Duration::ZERO, Duration::ZERO, 1.0);
        let result = transport.execute("uname -a").await.unwrap();

        assert_eq!(result.outcome, Outcome::Success);
    }

    #[test]
    fn test_delay_sampling_stays_in_range() {
        let transport = ScriptedTransport::with_timing(
            Duration::from_millis(10),
            Duration::from_millis(20),
            0.0,
        );

        for _ in 0..50 {
            let delay = transport.sample_delay();
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(20));
        }
    }
}
