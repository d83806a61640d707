//! Rendering of run and sweep results

use std::fmt::Write as _;

use mobility_simulator_core_rs::{AggregateResult, SeriesKind, SweepResult};

/// Trial-averaged statistics per generation, one block per series.
pub fn aggregate_table(result: &AggregateResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "config {}  trials {}  aborted {}",
        result.config_fingerprint,
        result.ntrials(),
        result.failures.len()
    );

    for kind in SeriesKind::ALL {
        let _ = writeln!(out, "\n{}", kind);
        let Some(avg) = result.series(kind).trial_average() else {
            let _ = writeln!(out, "  (no completed trials)");
            continue;
        };
        let _ = writeln!(out, "{}", header(kind));
        for t in 0..avg.len() {
            let gini = avg.gini.as_ref().map(|g| g[t]);
            let _ = writeln!(out, "{}", row(t, avg.mean[t], avg.sd[t], gini));
        }
    }
    out
}

/// Long `(param, time)` table per series.
pub fn sweep_table(sweep: &SweepResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "sweep over {}  values {:?}", sweep.param, sweep.values());

    for kind in SeriesKind::ALL {
        let _ = writeln!(out, "\n{}", kind);
        let _ = writeln!(out, "{:>12}{}", "param", header(kind));
        for r in sweep.rows(kind) {
            let _ = writeln!(
                out,
                "{:>12.4}{}",
                r.param,
                row(r.time, r.mean, r.sd, r.gini)
            );
        }
    }
    out
}

fn header(kind: SeriesKind) -> String {
    let mut line = format!("{:>6}{:>14}{:>14}", "time", "mean", "sd");
    if kind.tracks_gini() {
        line.push_str(&format!("{:>10}", "gini"));
    }
    line
}

fn row(time: usize, mean: f64, sd: f64, gini: Option<f64>) -> String {
    let mut line = format!("{:>6}{:>14.6}{:>14.6}", time, mean, sd);
    if let Some(g) = gini {
        line.push_str(&format!("{:>10.4}", g));
    }
    line
}
