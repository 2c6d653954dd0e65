//! One feeder run: first-start setup, daily ephemeris refresh, simulator
//! and transmitter.
//!
//! State comes in as a `Params` value and goes back out to the caller; it
//! is written to disk only after a successful download, right before the
//! simulator starts. A first start that fails to download is therefore
//! repeated in full on the next run.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use brdc_core::config::{save_params, Params};
use brdc_core::netrc::Platform;
use brdc_core::schedule::{default_target_date, update_due};
use brdc_core::types::{BrdcError, Result, HACKRF_INSTALL_URL};

use crate::credentials::ensure_credentials;
use crate::ephemeris::{decompress, prune_previous};
use crate::fetch::{fetch_ephemeris, EphemerisSource};
use crate::invoke::{build_command, simulator_command, transmitter_command, CommandRunner};
use crate::prompt::Prompter;

/// What happened to the ephemeris during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Last update is less than a day old.
    NotDue,
    /// New decompressed ephemeris file.
    Updated(PathBuf),
    /// Download failed, the files of a previous run are used.
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub built: bool,
    pub update: UpdateOutcome,
    pub simulated: bool,
    pub transmitted: bool,
}

/// Everything a run touches outside of `Params`.
pub struct Feeder<'a> {
    /// Directory holding params.ini, the simulator and the ephemeris files.
    pub work_dir: PathBuf,
    pub params_path: PathBuf,
    /// User home for the netrc lookup, `None` if it can't be determined.
    pub home: Option<PathBuf>,
    pub platform: Option<Platform>,
    pub source: &'a dyn EphemerisSource,
    pub prompter: &'a mut dyn Prompter,
    pub runner: &'a mut dyn CommandRunner,
}

impl Feeder<'_> {
    /// Execute one run at local time `now` and return the updated params.
    pub async fn run(
        &mut self,
        mut params: Params,
        now: NaiveDateTime,
    ) -> Result<(Params, RunReport)> {
        let first_start = params.first_start;
        let mut report = RunReport {
            built: false,
            update: UpdateOutcome::NotDue,
            simulated: false,
            transmitted: false,
        };

        let due = if first_start {
            self.first_start_setup(&params)?;
            report.built = true;
            params.first_start = false;
            true
        } else {
            update_due(params.update.last_date, now)
        };

        if due {
            let target = default_target_date(now);
            let fetched =
                fetch_ephemeris(self.source, &params.archive.url, target, &self.work_dir).await;
            match fetched {
                Some(compressed) => {
                    let raw = self.install(&mut params, &compressed, now)?;
                    let cmd = simulator_command(&params.simulator, &self.work_dir, &raw);
                    self.runner.run(&cmd, &self.work_dir);
                    report.simulated = true;
                    report.update = UpdateOutcome::Updated(raw);
                }
                None if first_start => {
                    error!(
                        "internet connection is required to download the ephemeris, \
                         check it and the netrc file"
                    );
                    return Err(BrdcError::NoEphemeris);
                }
                None => {
                    warn!("ephemeris download failed, running with the current ephemeris");
                    report.update = UpdateOutcome::FetchFailed;
                }
            }
        } else {
            info!("ephemeris update not needed");
        }

        info!("starting {}", params.transmitter.binary);
        self.runner
            .run(&transmitter_command(&params.transmitter), &self.work_dir);
        report.transmitted = true;

        Ok((params, report))
    }

    /// Credentials and the one-time simulator build.
    fn first_start_setup(&mut self, params: &Params) -> Result<()> {
        let home = self.home.as_deref().ok_or(BrdcError::UnsupportedPlatform)?;
        ensure_credentials(
            home,
            self.platform,
            &params.archive.credential_host,
            &mut *self.prompter,
        )?;

        info!("HackRF has to be installed before the next step: {HACKRF_INSTALL_URL}");
        info!("building {}", params.simulator.binary);
        self.runner
            .run(&build_command(&params.simulator), &self.work_dir);
        Ok(())
    }

    /// Replace the previous file pair with `compressed` and persist the new
    /// state. Returns the decompressed path.
    fn install(
        &self,
        params: &mut Params,
        compressed: &Path,
        now: NaiveDateTime,
    ) -> Result<PathBuf> {
        prune_previous(
            &self.work_dir,
            params.update.last_file_name.as_deref(),
            compressed,
        )?;
        let raw = decompress(compressed)?;

        params.update.last_date = Some(now);
        params.update.last_file_name = compressed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        save_params(&self.params_path, params)?;

        Ok(raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    use brdc_core::config::{load_params, PARAMS_FILE};
    use brdc_core::schedule::parse_timestamp;

    use crate::ephemeris::tests::gzip;
    use crate::fetch::tests::StubSource;
    use crate::invoke::tests::RecordingRunner;
    use crate::prompt::ScriptedPrompter;

    struct Setup {
        work: TempDir,
        home: TempDir,
    }

    impl Setup {
        /// Work dir plus a home dir that already has Earthdata credentials.
        fn new() -> Self {
            let setup = Setup {
                work: tempfile::tempdir().unwrap(),
                home: tempfile::tempdir().unwrap(),
            };
            fs::write(
                setup.home.path().join(".netrc"),
                "machine urs.earthdata.nasa.gov login alice password pw\n",
            )
            .unwrap();
            setup
        }

        fn params_path(&self) -> PathBuf {
            self.work.path().join(PARAMS_FILE)
        }

        fn params(&self) -> Params {
            load_params(&self.params_path()).unwrap()
        }

        async fn run(
            &self,
            params: Params,
            now: NaiveDateTime,
            source: &StubSource,
            prompter: &mut ScriptedPrompter,
            runner: &mut RecordingRunner,
        ) -> Result<(Params, RunReport)> {
            let mut feeder = Feeder {
                work_dir: self.work.path().to_path_buf(),
                params_path: self.params_path(),
                home: Some(self.home.path().to_path_buf()),
                platform: Some(Platform::Unix),
                source,
                prompter,
                runner,
            };
            feeder.run(params, now).await
        }

        fn ephemeris_files(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(self.work.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|n| n.starts_with("brdc"))
                .collect();
            names.sort();
            names
        }
    }

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn serving(dates: &[NaiveDate]) -> StubSource {
        StubSource::serving(
            dates
                .iter()
                .map(|d| (*d, gzip(format!("nav data {d}").as_bytes())))
                .collect(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_first_start_declined_credentials_stops_early() {
        let setup = Setup::new();
        fs::remove_file(setup.home.path().join(".netrc")).unwrap();
        let source = serving(&[date(2025, 3, 28)]);
        let mut prompter = ScriptedPrompter::new(&["n", ""]);
        let mut runner = RecordingRunner::default();

        let result = setup
            .run(Params::default(), ts("2025-03-29 10:00:00"), &source, &mut prompter, &mut runner)
            .await;

        assert!(matches!(result, Err(BrdcError::SetupDeclined)));
        assert!(runner.calls.is_empty());
        assert_eq!(source.request_count(), 0);
        assert!(!setup.params_path().exists());
    }

    #[tokio::test]
    async fn test_first_start_unsupported_platform() {
        let setup = Setup::new();
        let source = serving(&[date(2025, 3, 28)]);
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();

        let mut feeder = Feeder {
            work_dir: setup.work.path().to_path_buf(),
            params_path: setup.params_path(),
            home: Some(setup.home.path().to_path_buf()),
            platform: None,
            source: &source,
            prompter: &mut prompter,
            runner: &mut runner,
        };
        let result = feeder.run(Params::default(), ts("2025-03-29 10:00:00")).await;

        assert!(matches!(result, Err(BrdcError::UnsupportedPlatform)));
        assert!(runner.calls.is_empty());
        assert_eq!(source.request_count(), 0);
    }

    #[tokio::test]
    async fn test_first_start_builds_fetches_and_transmits() {
        let setup = Setup::new();
        let source = serving(&[date(2025, 3, 28)]);
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();
        let now = ts("2025-03-29 10:00:00.250000");

        let (params, report) = setup
            .run(Params::default(), now, &source, &mut prompter, &mut runner)
            .await
            .unwrap();

        let raw = setup.work.path().join("brdc0870.25n");
        assert!(report.built && report.simulated && report.transmitted);
        assert_eq!(report.update, UpdateOutcome::Updated(raw.clone()));
        assert_eq!(fs::read_to_string(&raw).unwrap(), "nav data 2025-03-28");

        let programs = runner.programs();
        assert_eq!(programs.len(), 3);
        assert_eq!(programs[0], "gcc");
        assert!(programs[1].ends_with("gps-sdr-sim"));
        assert_eq!(programs[2], "hackrf_transfer");
        assert_eq!(runner.calls[1].args[1], raw.display().to_string());

        // persisted state matches the returned state
        assert_eq!(setup.params(), params);
        assert!(!params.first_start);
        assert_eq!(params.update.last_date, Some(now));
        assert_eq!(params.update.last_file_name.as_deref(), Some("brdc0870.25n.gz"));
    }

    #[tokio::test]
    async fn test_first_start_without_network_is_fatal() {
        let setup = Setup::new();
        let source = StubSource::default();
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();

        let result = setup
            .run(Params::default(), ts("2025-03-29 10:00:00"), &source, &mut prompter, &mut runner)
            .await;

        assert!(matches!(result, Err(BrdcError::NoEphemeris)));
        assert_eq!(source.request_count(), 6);
        assert_eq!(runner.programs(), vec!["gcc".to_string()]);
        // first start is repeated next time
        assert!(!setup.params_path().exists());
    }

    #[tokio::test]
    async fn test_second_run_same_day_skips_update() {
        let setup = Setup::new();
        let source = serving(&[date(2025, 3, 28)]);
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();

        setup
            .run(Params::default(), ts("2025-03-29 10:00:00"), &source, &mut prompter, &mut runner)
            .await
            .unwrap();
        assert_eq!(source.request_count(), 1);

        let mut runner = RecordingRunner::default();
        let (_, report) = setup
            .run(setup.params(), ts("2025-03-29 18:30:00"), &source, &mut prompter, &mut runner)
            .await
            .unwrap();

        assert_eq!(source.request_count(), 1);
        assert_eq!(report.update, UpdateOutcome::NotDue);
        assert!(!report.built && !report.simulated && report.transmitted);
        assert_eq!(runner.programs(), vec!["hackrf_transfer".to_string()]);
    }

    #[tokio::test]
    async fn test_second_update_leaves_one_pair() {
        let setup = Setup::new();
        let source = serving(&[date(2025, 3, 28), date(2025, 3, 30)]);
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();
        let first = ts("2025-03-29 10:00:00");

        setup
            .run(Params::default(), first, &source, &mut prompter, &mut runner)
            .await
            .unwrap();
        assert_eq!(
            setup.ephemeris_files(),
            vec!["brdc0870.25n", "brdc0870.25n.gz"]
        );

        let (params, report) = setup
            .run(setup.params(), first + Duration::days(2), &source, &mut prompter, &mut runner)
            .await
            .unwrap();

        assert!(matches!(report.update, UpdateOutcome::Updated(_)));
        assert_eq!(params.update.last_file_name.as_deref(), Some("brdc0890.25n.gz"));
        assert_eq!(
            setup.ephemeris_files(),
            vec!["brdc0890.25n", "brdc0890.25n.gz"]
        );
    }

    #[tokio::test]
    async fn test_routine_fetch_failure_keeps_current_files() {
        let setup = Setup::new();
        let source = serving(&[date(2025, 3, 28)]);
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();

        let (params, _) = setup
            .run(Params::default(), ts("2025-03-29 10:00:00"), &source, &mut prompter, &mut runner)
            .await
            .unwrap();

        let offline = StubSource::default();
        let mut runner = RecordingRunner::default();
        let (after, report) = setup
            .run(params.clone(), ts("2025-04-10 10:00:00"), &offline, &mut prompter, &mut runner)
            .await
            .unwrap();

        assert_eq!(report.update, UpdateOutcome::FetchFailed);
        assert!(report.transmitted && !report.simulated);
        assert_eq!(runner.programs(), vec!["hackrf_transfer".to_string()]);
        assert_eq!(after, params);
        assert_eq!(setup.params(), params);
        assert_eq!(
            setup.ephemeris_files(),
            vec!["brdc0870.25n", "brdc0870.25n.gz"]
        );
    }

    #[tokio::test]
    async fn test_routine_without_last_date_updates() {
        let setup = Setup::new();
        let source = serving(&[date(2025, 3, 28)]);
        let mut prompter = ScriptedPrompter::default();
        let mut runner = RecordingRunner::default();
        let mut params = Params::default();
        params.first_start = false;

        let (_, report) = setup
            .run(params, ts("2025-03-29 10:00:00"), &source, &mut prompter, &mut runner)
            .await
            .unwrap();

        assert!(!report.built);
        assert!(matches!(report.update, UpdateOutcome::Updated(_)));
        assert_eq!(prompter.reads, 0);
    }
}
