//! Device-scoped remote playback over the partner HTTPS API.
//!
//! The partner API wants a bearer token (fetched from our own backend) and
//! a registered playback device. Connecting polls the device list until one
//! shows up, then every clip is a play-from-uri scoped to that device
//! followed by a timer-scheduled pause.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::{Receiver, Sender, unbounded};
use ureq::Agent;

use heardle_types::{Device, DeviceList, PlayFromUriRequest};

use super::PlayerEvent;

pub(crate) const PARTNER_API_BASE: &str = "https://api.spotify.com";

const READY_POLL: Duration = Duration::from_secs(1);
const READY_ATTEMPTS: u32 = 30;

/// Which partner call a status code came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Devices,
    Play,
    Pause,
}

/// Map a partner-API failure status onto the lifecycle event vocabulary.
pub(crate) fn lifecycle_error(stage: Stage, status: u16) -> PlayerEvent {
    match status {
        401 => PlayerEvent::AuthError(format!("authentication failed ({status})")),
        403 => PlayerEvent::AccountError("Premium account required".to_string()),
        _ => match stage {
            Stage::Devices => PlayerEvent::InitError(format!("device list failed with {status}")),
            Stage::Play => PlayerEvent::PlaybackError(format!("play failed with {status}")),
            Stage::Pause => PlayerEvent::PlaybackError(format!("pause failed with {status}")),
        },
    }
}

/// Prefer the device the user already plays on; else take the first.
pub(crate) fn choose_device(list: &DeviceList) -> Option<&Device> {
    list.devices
        .iter()
        .find(|d| d.is_active)
        .or_else(|| list.devices.first())
}

pub(crate) struct ConnectDriver {
    agent: Agent,
    base: String,
    token: Arc<Mutex<Option<String>>>,
    device_id: Arc<Mutex<Option<String>>>,
    tx: Sender<PlayerEvent>,
    rx: Receiver<PlayerEvent>,
}

impl ConnectDriver {
    pub(crate) fn new() -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        let (tx, rx) = unbounded();
        Self {
            agent: Agent::new_with_config(config),
            base: PARTNER_API_BASE.to_string(),
            token: Arc::new(Mutex::new(None)),
            device_id: Arc::new(Mutex::new(None)),
            tx,
            rx,
        }
    }

    pub(crate) fn events(&self) -> &Receiver<PlayerEvent> {
        &self.rx
    }

    pub(crate) fn ready(&self) -> bool {
        self.token.lock().unwrap().is_some() && self.device_id.lock().unwrap().is_some()
    }

    /// Store the bearer token and start waiting for a playback device.
    /// Emits `Ready { device_id }` once one appears.
    pub(crate) fn connect(&mut self, token: String) {
        *self.token.lock().unwrap() = Some(token.clone());

        let agent = self.agent.clone();
        let base = self.base.clone();
        let device_slot = self.device_id.clone();
        let tx = self.tx.clone();

        thread::spawn(move || {
            let mut reported_offline = false;
            for _ in 0..READY_ATTEMPTS {
                let list = match fetch_devices(&agent, &base, &token) {
                    Ok(Ok(list)) => list,
                    Ok(Err(status)) => {
                        let event = lifecycle_error(Stage::Devices, status);
                        let fatal = matches!(
                            event,
                            PlayerEvent::AuthError(_) | PlayerEvent::AccountError(_)
                        );
                        tx.send(event).ok();
                        if fatal {
                            return;
                        }
                        thread::sleep(READY_POLL);
                        continue;
                    }
                    Err(e) => {
                        tx.send(PlayerEvent::InitError(format!("{e:#}"))).ok();
                        thread::sleep(READY_POLL);
                        continue;
                    }
                };

                if let Some(device) = choose_device(&list) {
                    *device_slot.lock().unwrap() = Some(device.id.clone());
                    tx.send(PlayerEvent::Ready {
                        device_id: device.id.clone(),
                    })
                    .ok();
                    return;
                }

                if !reported_offline {
                    reported_offline = true;
                    tx.send(PlayerEvent::NotReady).ok();
                }
                thread::sleep(READY_POLL);
            }
            tx.send(PlayerEvent::InitError(
                "no playback device appeared".to_string(),
            ))
            .ok();
        });
    }

    /// Start the track on the registered device, then pause after `secs`.
    pub(crate) fn play_clip(&mut self, uri: &str, secs: u32) -> Result<()> {
        let token = self
            .token
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("Player not ready: no playback token yet"))?;
        let device_id = self
            .device_id
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("Player not ready: waiting for a playback device"))?;

        let url = format!("{}/v1/me/player/play?device_id={}", self.base, device_id);
        let resp = self
            .agent
            .put(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send_json(&PlayFromUriRequest {
                uris: vec![uri.to_string()],
            })
            .context("partner play request")?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            self.tx.send(lifecycle_error(Stage::Play, status)).ok();
            bail!("Failed to play track: {status}");
        }
        self.tx.send(PlayerEvent::ClipStarted).ok();

        // Timer-scheduled pause; the partner keeps playing until told not to.
        let agent = self.agent.clone();
        let base = self.base.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(u64::from(secs)));
            match pause(&agent, &base, &token, &device_id) {
                Ok(Some(status)) => {
                    tx.send(lifecycle_error(Stage::Pause, status)).ok();
                }
                Ok(None) => {}
                Err(e) => {
                    tx.send(PlayerEvent::PlaybackError(format!("{e:#}"))).ok();
                }
            }
            tx.send(PlayerEvent::ClipFinished).ok();
        });
        Ok(())
    }

    /// Best-effort pause, used on quit and before a new game.
    pub(crate) fn stop(&mut self) {
        let token = self.token.lock().unwrap().clone();
        let device_id = self.device_id.lock().unwrap().clone();
        let (Some(token), Some(device_id)) = (token, device_id) else {
            return;
        };
        let agent = self.agent.clone();
        let base = self.base.clone();
        thread::spawn(move || {
            let _ = pause(&agent, &base, &token, &device_id);
        });
    }
}

/// `Ok(Ok(list))` on 2xx, `Ok(Err(status))` on HTTP failure, `Err` on
/// transport/decode failure.
fn fetch_devices(
    agent: &Agent,
    base: &str,
    token: &str,
) -> Result<Result<DeviceList, u16>> {
    let url = format!("{base}/v1/me/player/devices");
    let mut resp = agent
        .get(&url)
        .header("Authorization", format!("Bearer {token}"))
        .call()
        .context("partner device list request")?;
    if !resp.status().is_success() {
        return Ok(Err(resp.status().as_u16()));
    }
    let body = resp
        .body_mut()
        .read_to_string()
        .context("read device list body")?;
    let list = serde_json::from_str(&body).context("decode device list")?;
    Ok(Ok(list))
}

/// `Ok(None)` on success, `Ok(Some(status))` on HTTP failure.
fn pause(agent: &Agent, base: &str, token: &str, device_id: &str) -> Result<Option<u16>> {
    let url = format!("{base}/v1/me/player/pause?device_id={device_id}");
    let resp = agent
        .put(&url)
        .header("Authorization", format!("Bearer {token}"))
        .send_empty()
        .context("partner pause request")?;
    if resp.status().is_success() {
        Ok(None)
    } else {
        Ok(Some(resp.status().as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_auth_error() {
        assert!(matches!(
            lifecycle_error(Stage::Devices, 401),
            PlayerEvent::AuthError(_)
        ));
        assert!(matches!(
            lifecycle_error(Stage::Play, 401),
            PlayerEvent::AuthError(_)
        ));
    }

    #[test]
    fn account_restriction_mentions_premium() {
        let PlayerEvent::AccountError(msg) = lifecycle_error(Stage::Play, 403) else {
            panic!("expected AccountError");
        };
        assert_eq!(msg, "Premium account required");
    }

    #[test]
    fn other_failures_map_per_stage() {
        assert!(matches!(
            lifecycle_error(Stage::Devices, 500),
            PlayerEvent::InitError(_)
        ));
        assert!(matches!(
            lifecycle_error(Stage::Play, 502),
            PlayerEvent::PlaybackError(_)
        ));
        assert!(matches!(
            lifecycle_error(Stage::Pause, 404),
            PlayerEvent::PlaybackError(_)
        ));
    }

    #[test]
    fn active_device_wins_over_list_order() {
        let list = DeviceList {
            devices: vec![
                Device {
                    id: "first".into(),
                    name: "Desk".into(),
                    is_active: false,
                },
                Device {
                    id: "active".into(),
                    name: "Kitchen".into(),
                    is_active: true,
                },
            ],
        };
        assert_eq!(choose_device(&list).unwrap().id, "active");
    }

    #[test]
    fn first_device_is_fallback() {
        let list = DeviceList {
            devices: vec![Device {
                id: "only".into(),
                name: "Desk".into(),
                is_active: false,
            }],
        };
        assert_eq!(choose_device(&list).unwrap().id, "only");
    }

    #[test]
    fn empty_device_list_yields_none() {
        assert!(choose_device(&DeviceList::default()).is_none());
    }
}
