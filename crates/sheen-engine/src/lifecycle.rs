//! Effect lifecycle: the enable/disable state machine.
//!
//! The controller decides which host listeners must be attached or detached;
//! the host performs the returned [`HostAction`]s. Both transitions are
//! idempotent: repeating one returns no actions.

/// Which input drives the light on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModality {
    Pointer,
    Orientation,
}

/// Availability of device-orientation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationSupport {
    Unsupported,
    Available,
    /// Available only after an explicit user grant.
    RequiresPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub modality: InputModality,
    pub orientation: OrientationSupport,
}

impl Platform {
    pub fn desktop() -> Self {
        Self {
            modality: InputModality::Pointer,
            orientation: OrientationSupport::Unsupported,
        }
    }

    pub fn mobile(orientation: OrientationSupport) -> Self {
        Self {
            modality: InputModality::Orientation,
            orientation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    NotRequested,
    Awaiting,
    Granted,
    Denied,
}

/// Listener changes the host must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    AttachPointer,
    DetachPointer,
    AttachOrientation,
    DetachOrientation,
    AttachVisibility,
    DetachVisibility,
    ShowPermissionPrompt,
    HidePermissionPrompt,
}

pub struct LifecycleController {
    platform: Platform,
    state: EffectState,
    permission: Permission,
    pointer_attached: bool,
    orientation_attached: bool,
}

impl LifecycleController {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: EffectState::Disabled,
            permission: Permission::NotRequested,
            pointer_attached: false,
            orientation_attached: false,
        }
    }

    pub fn enable(&mut self) -> Vec<HostAction> {
        if self.state == EffectState::Enabled {
            return Vec::new();
        }
        self.state = EffectState::Enabled;
        let mut actions = Vec::with_capacity(3);

        match self.platform.modality {
            InputModality::Pointer => {
                self.pointer_attached = true;
                actions.push(HostAction::AttachPointer);
            }
            InputModality::Orientation => match self.platform.orientation {
                OrientationSupport::Available => {
                    self.orientation_attached = true;
                    actions.push(HostAction::AttachOrientation);
                }
                OrientationSupport::RequiresPermission
                    if self.permission == Permission::Granted =>
                {
                    self.orientation_attached = true;
                    actions.push(HostAction::AttachOrientation);
                }
                OrientationSupport::RequiresPermission => {
                    self.permission = Permission::Awaiting;
                    actions.push(HostAction::ShowPermissionPrompt);
                }
                OrientationSupport::Unsupported => {
                    log::warn!("device orientation unsupported; reflections stay inert");
                }
            },
        }

        actions.push(HostAction::AttachVisibility);
        log::debug!("reflection effect enabled: {:?}", actions);
        actions
    }

    pub fn disable(&mut self) -> Vec<HostAction> {
        if self.state == EffectState::Disabled {
            return Vec::new();
        }
        self.state = EffectState::Disabled;
        let mut actions = Vec::with_capacity(3);

        if std::mem::take(&mut self.pointer_attached) {
            actions.push(HostAction::DetachPointer);
        }
        if std::mem::take(&mut self.orientation_attached) {
            actions.push(HostAction::DetachOrientation);
        }
        if matches!(self.permission, Permission::Awaiting | Permission::Denied) {
            self.permission = Permission::NotRequested;
            actions.push(HostAction::HidePermissionPrompt);
        }

        actions.push(HostAction::DetachVisibility);
        log::debug!("reflection effect disabled: {:?}", actions);
        actions
    }

    /// Outcome of the platform permission prompt. Only meaningful while a
    /// permission-gated orientation platform is waiting on the prompt (or
    /// retrying after a denial); anything else is ignored.
    ///
    /// A grant attaches the orientation listener; a denial leaves it inert
    /// and keeps the prompt up so the user can retry.
    pub fn resolve_permission(&mut self, granted: bool) -> Vec<HostAction> {
        if !self.awaiting_permission() {
            log::debug!("permission outcome ignored ({:?}, {:?})", self.platform, self.permission);
            return Vec::new();
        }
        if !granted {
            if self.permission == Permission::Awaiting {
                self.permission = Permission::Denied;
                log::warn!("device orientation permission denied");
            }
            return Vec::new();
        }
        self.permission = Permission::Granted;
        self.orientation_attached = true;
        vec![HostAction::AttachOrientation, HostAction::HidePermissionPrompt]
    }

    fn awaiting_permission(&self) -> bool {
        self.platform.modality == InputModality::Orientation
            && self.platform.orientation == OrientationSupport::RequiresPermission
            && self.state == EffectState::Enabled
            && !self.orientation_attached
            && matches!(self.permission, Permission::Awaiting | Permission::Denied)
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == EffectState::Enabled
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn orientation_active(&self) -> bool {
        self.orientation_attached
    }

    pub fn pointer_active(&self) -> bool {
        self.pointer_attached
    }
}
