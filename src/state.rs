use crate::actuation::Actuator;
use crate::commands::{self, Command};
use crate::config::AppConfig;
use crate::error::{CtrlBotError, Result};
use crate::irc::Message;
use crate::mirror::Mirror;
use crate::platform::{self, PadSource, VirtualPad};
use crate::vxbox::{Controller, VXbox};
use crate::xinput::Gamepad;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub fn help_hint(prefix: &str) -> String {
    format!(
        "Type {0}help to see available commands. Type {0}help <command> to see help for specific command.",
        prefix
    )
}

pub struct Inner {
    pub bus: Option<VXbox>,
    pub controller: Option<Arc<Controller>>,
    pub pad: Option<Arc<dyn VirtualPad>>,
    pub source: Option<Arc<dyn PadSource>>,
    pub mirror: Mirror,
    /// Per channel: the connection the reminder posts to, and its task.
    pub reminders: HashMap<String, (UnboundedSender<Message>, JoinHandle<()>)>,
    /// Writer of the current IRC connection.
    pub connection: Option<UnboundedSender<Message>>,
}

impl Inner {
    /// Plug in the virtual controller and start mirroring, once.
    ///
    /// A missing physical pad only disables mirroring; the chat commands still work.
    fn init_controller(&mut self, config: &AppConfig) -> Result<()> {
        if self.pad.is_none() {
            let bus = match &self.bus {
                Some(bus) => bus.clone(),
                None => {
                    let bus = VXbox::load(&config.vxbox.dll_path)?;
                    self.bus = Some(bus.clone());
                    bus
                }
            };
            if !bus.vbus_exists() {
                return Err(CtrlBotError::VirtualBus("virtual bus is not installed".into()));
            }
            match bus.empty_bus_slots() {
                Ok(slots) => log::info!("Available controllers: {}", slots),
                Err(e) => log::warn!("Could not count empty bus slots: {}", e),
            }
            let controller = Arc::new(bus.controller(config.vxbox.controller_id)?);
            match controller.led_number() {
                Ok(led) => log::info!("Virtual controller {} has LED {}", controller.id(), led),
                Err(e) => log::debug!("{}", e),
            }
            self.controller = Some(controller.clone());
            self.pad = Some(controller);
        }

        if config.xinput.mirror && !self.mirror.is_running() {
            let pad = self
                .pad
                .clone()
                .ok_or_else(|| CtrlBotError::VirtualBus("controller is not initialized".into()))?;
            let source = match &self.source {
                Some(source) => source.clone(),
                None => {
                    let source = platform::create_pad_source()?;
                    self.source = Some(source.clone());
                    source
                }
            };
            let gamepad = Gamepad::first_connected(source, config.xinput.device)?;
            self.mirror.start(gamepad, pad, &config.xinput);
        }
        Ok(())
    }
}

pub struct AppState {
    config: AppConfig,
    inner: Mutex<Inner>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                bus: None,
                controller: None,
                pad: None,
                source: None,
                mirror: Mirror::new(),
                reminders: HashMap::new(),
                connection: None,
            }),
        }
    }

    /// State with devices supplied up front instead of loaded from DLLs.
    pub fn with_devices(
        config: AppConfig,
        pad: Arc<dyn VirtualPad>,
        source: Option<Arc<dyn PadSource>>,
    ) -> Self {
        let state = Self::new(config);
        {
            let mut inner = state.lock_inner();
            inner.pad = Some(pad);
            inner.source = source;
        }
        state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn actuator(&self) -> Option<Actuator> {
        let pad = self.lock_inner().pad.clone()?;
        Some(Actuator::new(pad, self.config.actuation.clone()))
    }

    /// The bot itself joined `channel`.
    pub fn on_joined(&self, channel: &str, outgoing: &UnboundedSender<Message>) {
        log::info!("bot has joined channel: {}", channel);
        let mut inner = self.lock_inner();

        // A reminder left over from a previous connection posts nowhere.
        let reminder_running = inner
            .reminders
            .get(channel)
            .is_some_and(|(sender, task)| {
                sender.same_channel(outgoing) && !task.is_finished()
            });
        if !reminder_running {
            let task = spawn_help_reminder(
                channel.to_string(),
                help_hint(&self.config.irc.command_prefix),
                Duration::from_secs(self.config.irc.help_reminder_secs.max(1)),
                outgoing.clone(),
            );
            if let Some((_, stale)) = inner
                .reminders
                .insert(channel.to_string(), (outgoing.clone(), task))
            {
                stale.abort();
            }
        }

        match inner.init_controller(&self.config) {
            Ok(()) => log::info!("initialized controller"),
            Err(e) => log::error!("failed to initialize controller: {}", e),
        }
    }

    /// Run a parsed chat command, returning lines to reply with.
    pub async fn run_command(&self, command: &Command) -> Vec<String> {
        let actuator = self.actuator();
        let prefix = &self.config.irc.command_prefix;
        match commands::execute(command, actuator.as_ref(), prefix).await {
            Ok(lines) => lines,
            Err(e @ (CtrlBotError::Usage(_) | CtrlBotError::InvalidDirection(_))) => {
                vec![e.to_string()]
            }
            Err(e) => {
                log::error!("command {:?} failed: {}", command, e);
                vec![]
            }
        }
    }

    /// Remember where a new connection's outgoing lines go.
    pub fn set_connection(&self, outgoing: UnboundedSender<Message>) {
        self.lock_inner().connection = Some(outgoing);
    }

    /// Send `QUIT` on the current connection. False when there is none.
    pub fn quit(&self, reason: &str) -> bool {
        let inner = self.lock_inner();
        inner
            .connection
            .as_ref()
            .is_some_and(|outgoing| outgoing.send(Message::quit(reason)).is_ok())
    }

    pub fn shutdown(&self) {
        let mut inner = self.lock_inner();
        inner.mirror.stop();
        inner.connection = None;
        for (_, (_, task)) in inner.reminders.drain() {
            task.abort();
        }
        inner.pad = None;
        if let Some(controller) = inner.controller.take() {
            if controller.destroy(false) {
                log::info!("Unplugged virtual controller {}", controller.id());
            } else {
                log::warn!("Failed to unplug virtual controller {}", controller.id());
            }
        }
    }
}

fn spawn_help_reminder(
    channel: String,
    hint: String,
    every: Duration,
    outgoing: UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if outgoing.send(Message::privmsg(&channel, &hint)).is_err() {
                break;
            }
            tokio::time::sleep(every).await;
        }
    })
}
