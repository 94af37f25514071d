//! Audio alert queue
//!
//! Alerts are handed to a single playback worker so a slow decode never
//! delays command dispatch. The worker plays one clip at a time, which also
//! keeps a clip from being decoded twice concurrently. Outcomes go to the log.

use super::player::AudioPlayer;
use crate::error::MediaFault;
use alarm_shared::Alarm;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Default number of alerts that may wait behind the one playing
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// An audio file bound to an alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub alarm: Alarm,
    pub path: PathBuf,
}

/// Fixed alarm-to-clip table
#[derive(Debug, Clone, Default)]
pub struct ClipTable {
    clips: BTreeMap<Alarm, PathBuf>,
}

impl ClipTable {
    pub fn new(clips: impl IntoIterator<Item = (Alarm, PathBuf)>) -> Self {
        Self {
            clips: clips.into_iter().collect(),
        }
    }

    /// The clip bound to `alarm`, if any
    pub fn clip(&self, alarm: Alarm) -> Option<AudioClip> {
        self.clips.get(&alarm).map(|path| AudioClip {
            alarm,
            path: path.clone(),
        })
    }
}

/// Handle to the playback worker
#[derive(Debug, Clone)]
pub struct AudioAlertPlayer {
    queue: mpsc::Sender<AudioClip>,
}

impl AudioAlertPlayer {
    /// Spawn the playback worker. The worker exits once every handle is
    /// dropped and the queue has drained.
    pub fn spawn(player: Arc<dyn AudioPlayer>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, requests) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(playback_worker(player, requests));
        (Self { queue }, worker)
    }

    /// Queue a clip for playback without waiting for it
    pub fn play(&self, clip: AudioClip) -> Result<(), MediaFault> {
        self.queue.try_send(clip).map_err(|err| match err {
            TrySendError::Full(clip) => MediaFault::QueueFull(clip.alarm),
            TrySendError::Closed(clip) => MediaFault::WorkerStopped(clip.alarm),
        })
    }
}

async fn playback_worker(player: Arc<dyn AudioPlayer>, mut requests: mpsc::Receiver<AudioClip>) {
    while let Some(clip) = requests.recv().await {
        match player.play(&clip.path).await {
            Ok(()) => info!("[AUDIO] Played {} alert ({})", clip.alarm, clip.path.display()),
            Err(fault) => warn!("[AUDIO] {} alert failed: {}", clip.alarm, fault),
        }
    }

    info!("[AUDIO] Playback worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{clip_path, MockAudioPlayer};
    use std::time::Duration;

    fn clip(alarm: Alarm) -> AudioClip {
        AudioClip {
            alarm,
            path: clip_path(alarm),
        }
    }

    #[test]
    fn test_clip_table_lookup() {
        let table = ClipTable::new([(Alarm::Fire, PathBuf::from("./audio/fire.mp3"))]);
        assert_eq!(table.clip(Alarm::Fire).unwrap().path, PathBuf::from("./audio/fire.mp3"));
        assert!(table.clip(Alarm::Shooter).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_does_not_wait_for_playback() {
        let player = Arc::new(MockAudioPlayer::slow(Duration::from_secs(10)));
        let (alerts, worker) = AudioAlertPlayer::spawn(player.clone(), DEFAULT_QUEUE_CAPACITY);

        let started = tokio::time::Instant::now();
        alerts.play(clip(Alarm::Fire)).unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);

        drop(alerts);
        worker.await.unwrap();
        assert_eq!(player.attempts(), vec![clip_path(Alarm::Fire)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_plays_one_clip_at_a_time() {
        let player = Arc::new(MockAudioPlayer::slow(Duration::from_secs(3)));
        let (alerts, worker) = AudioAlertPlayer::spawn(player.clone(), DEFAULT_QUEUE_CAPACITY);

        alerts.play(clip(Alarm::Fire)).unwrap();
        alerts.play(clip(Alarm::Fire)).unwrap();
        drop(alerts);
        worker.await.unwrap();

        let times = player.attempt_times();
        assert_eq!(times.len(), 2);
        assert_eq!(times[1] - times[0], Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_failed_playback_keeps_worker_alive() {
        let player = Arc::new(MockAudioPlayer::failing());
        let (alerts, worker) = AudioAlertPlayer::spawn(player.clone(), DEFAULT_QUEUE_CAPACITY);

        alerts.play(clip(Alarm::Shooter)).unwrap();
        alerts.play(clip(Alarm::Environmental)).unwrap();
        drop(alerts);
        worker.await.unwrap();

        assert_eq!(
            player.attempts(),
            vec![clip_path(Alarm::Shooter), clip_path(Alarm::Environmental)]
        );
    }

    #[tokio::test]
    async fn test_full_queue_drops_alert() {
        let player = Arc::new(MockAudioPlayer::new());
        let (alerts, _worker) = AudioAlertPlayer::spawn(player, 1);

        // The worker has not run yet, so the single slot is still taken
        alerts.play(clip(Alarm::Fire)).unwrap();
        assert!(matches!(
            alerts.play(clip(Alarm::Shooter)),
            Err(MediaFault::QueueFull(Alarm::Shooter))
        ));
    }

    #[tokio::test]
    async fn test_stopped_worker_is_reported() {
        let player = Arc::new(MockAudioPlayer::new());
        let (alerts, worker) = AudioAlertPlayer::spawn(player, 1);

        worker.abort();
        let _ = worker.await;

        assert!(matches!(
            alerts.play(clip(Alarm::Fire)),
            Err(MediaFault::WorkerStopped(Alarm::Fire))
        ));
    }
}
