//! Presenter that reports heads-up display text through the log.

use tracing::info;
use wave_siege_core::WaveIndex;
use wave_siege_presentation::{kills_label, warning_label, wave_label, Presenter};

/// Logs every call-in and remembers what it reported.
#[derive(Debug, Default)]
pub(crate) struct LogPresenter {
    waves_cleared: u32,
    total_kills: u32,
    headline: String,
}

impl LogPresenter {
    /// Number of waves reported as cleared.
    pub(crate) fn waves_cleared(&self) -> u32 {
        self.waves_cleared
    }

    /// Most recently reported kill total.
    pub(crate) fn total_kills(&self) -> u32 {
        self.total_kills
    }
}

impl Presenter for LogPresenter {
    fn on_wave_announced(&mut self, wave: WaveIndex) {
        self.headline = warning_label(wave);
        info!(hud = %self.headline, "wave incoming");
    }

    fn on_wave_started(&mut self, wave: WaveIndex) {
        self.headline = wave_label(wave);
        info!(hud = %self.headline, "wave started");
    }

    fn on_kill_count_changed(&mut self, total_kills: u32) {
        self.total_kills = total_kills;
        info!(kills = %kills_label(total_kills), "enemy down");
    }

    fn on_wave_completed(&mut self) {
        self.waves_cleared += 1;
        info!(cleared = self.waves_cleared, "wave cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_reported_progress() {
        let mut presenter = LogPresenter::default();
        presenter.on_wave_announced(WaveIndex::new(2));
        assert_eq!(presenter.headline, "!WAVE 02!");

        presenter.on_wave_started(WaveIndex::new(2));
        presenter.on_kill_count_changed(4);
        presenter.on_wave_completed();

        assert_eq!(presenter.headline, "WAVE 02");
        assert_eq!(presenter.total_kills(), 4);
        assert_eq!(presenter.waves_cleared(), 1);
    }
}
