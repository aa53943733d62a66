use crate::config::Settings;
use crate::error::Result;
use crate::subset::Subset;
use std::time::Duration;
use std::time::Instant;

/// named wall-clock phases accumulated over a run
#[derive(Debug, Default)]
pub struct Stopwatch {
    phases: Vec<(&'static str, Duration)>,
}

impl Stopwatch {
    pub fn time<T>(&mut self, phase: &'static str, work: impl FnOnce() -> T) -> T {
        let begin = Instant::now();
        let result = work();
        self.record(phase, begin.elapsed());
        result
    }

    pub fn record(&mut self, phase: &'static str, elapsed: Duration) {
        log::debug!("{} took {:.3}s", phase, elapsed.as_secs_f64());
        match self.phases.iter_mut().find(|(name, _)| *name == phase) {
            Some((_, total)) => *total += elapsed,
            None => self.phases.push((phase, elapsed)),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.phases
            .iter()
            .map(|(name, elapsed)| (name.to_string(), elapsed.as_secs_f64().into()))
            .collect::<serde_json::Map<String, serde_json::Value>>()
            .into()
    }
}

/// checkpointed throughput logging for long streams
#[derive(Debug)]
pub struct Progress {
    begin: Instant,
    latest: Instant,
    complete: usize,
    checkpoint: usize,
}

impl Progress {
    pub fn new(checkpoint: usize) -> Self {
        let now = Instant::now();
        Self {
            begin: now,
            latest: now,
            complete: 0,
            checkpoint,
        }
    }

    pub fn complete(&self) -> usize {
        self.complete
    }

    pub fn tick(&mut self) {
        self.complete += 1;
        if self.complete % self.checkpoint == 0 {
            let now = Instant::now();
            let overall = self.complete as f64 / now.duration_since(self.begin).as_secs_f64();
            let burst =
                self.checkpoint as f64 / now.duration_since(self.latest).as_secs_f64();
            self.latest = now;
            log::info!(
                "{} processed, {:.0}/s overall, {:.0}/s since last checkpoint",
                self.complete,
                overall,
                burst
            );
        }
    }
}

/// the result document every driver emits
pub fn document(
    settings: &Settings,
    algorithm: &str,
    subset: &Subset,
    watch: &Stopwatch,
) -> serde_json::Value {
    serde_json::json!({
        "k": settings.k,
        "algorithm": algorithm,
        "epsilon": settings.epsilon,
        "worldSize": settings.world_size,
        "inputSettings": settings.input_settings(),
        "subset": subset,
        "timings": watch.to_json(),
    })
}

/// a partial status document for runs that die before producing a subset
pub fn failure(settings: &Settings, error: &crate::error::Error) -> serde_json::Value {
    serde_json::json!({
        "k": settings.k,
        "inputSettings": settings.input_settings(),
        "error": error.to_string(),
    })
}

pub fn write(path: &std::path::Path, document: &serde_json::Value) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(document).expect("serializable") + "\n")?;
    log::info!("wrote {}", path.display());
    Ok(())
}
