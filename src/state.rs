//! UI-observable state. Every mutation goes through a setter that marks the
//! dependent views dirty; the shell repaints when the dirty set is non-empty
//! and clears it after drawing. No globals, no observer framework.

use crate::power::BatteryStatus;

/// Accent tag carried by calendar events and notifications. The shell maps
/// tags to actual colors; the data layer never needs a color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTag {
    Blue,
    Green,
    Purple,
    Red,
    Orange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotchTab {
    Media,
    Notifications,
    Calendar,
    Apps,
    Tray,
}

impl NotchTab {
    pub const ALL: [NotchTab; 5] = [
        NotchTab::Media,
        NotchTab::Notifications,
        NotchTab::Calendar,
        NotchTab::Apps,
        NotchTab::Tray,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NotchTab::Media => "Media",
            NotchTab::Notifications => "Notifications",
            NotchTab::Calendar => "Calendar",
            NotchTab::Apps => "Apps",
            NotchTab::Tray => "Tray",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            NotchTab::Media => "🎵",
            NotchTab::Notifications => "🔔",
            NotchTab::Calendar => "📅",
            NotchTab::Apps => "▦",
            NotchTab::Tray => "📥",
        }
    }
}

impl Default for NotchTab {
    fn default() -> Self {
        NotchTab::Media
    }
}

/// Renderable regions of the window, the nodes of the update graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewId {
    CollapsedStrip = 0,
    Header = 1,
    MediaPanel = 2,
    NotificationsPanel = 3,
    CalendarPanel = 4,
    AppsPanel = 5,
    TrayPanel = 6,
}

impl ViewId {
    pub const ALL: [ViewId; 7] = [
        ViewId::CollapsedStrip,
        ViewId::Header,
        ViewId::MediaPanel,
        ViewId::NotificationsPanel,
        ViewId::CalendarPanel,
        ViewId::AppsPanel,
        ViewId::TrayPanel,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// State fields a mutation can touch, the edges' origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Expanded,
    Pinned,
    Hovering,
    IndicatorVisible,
    SelectedTab,
    Clock,
    Battery,
    Track,
    Notifications,
    Events,
    Apps,
    TrayFiles,
}

/// The views that must re-render when a field changes.
pub fn dependents(field: Field) -> &'static [ViewId] {
    match field {
        Field::Expanded => &ViewId::ALL,
        Field::Pinned => &[ViewId::Header],
        Field::Hovering => &[ViewId::CollapsedStrip],
        Field::IndicatorVisible => &[ViewId::CollapsedStrip],
        Field::SelectedTab => &[
            ViewId::Header,
            ViewId::MediaPanel,
            ViewId::NotificationsPanel,
            ViewId::CalendarPanel,
            ViewId::AppsPanel,
            ViewId::TrayPanel,
        ],
        Field::Clock => &[ViewId::Header],
        Field::Battery => &[ViewId::Header],
        Field::Track => &[ViewId::MediaPanel],
        Field::Notifications => &[ViewId::NotificationsPanel],
        Field::Events => &[ViewId::CalendarPanel],
        Field::Apps => &[ViewId::AppsPanel],
        Field::TrayFiles => &[ViewId::TrayPanel],
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirtySet(u16);

impl DirtySet {
    pub fn mark(&mut self, view: ViewId) {
        self.0 |= view.bit();
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.0 & view.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

#[derive(Debug, Default)]
pub struct NotchState {
    expanded: bool,
    pinned: bool,
    hovering: bool,
    indicator_visible: bool,
    selected_tab: NotchTab,
    clock_text: String,
    battery: Option<BatteryStatus>,
    dirty: DirtySet,
}

impl NotchState {
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn hovering(&self) -> bool {
        self.hovering
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    pub fn selected_tab(&self) -> NotchTab {
        self.selected_tab
    }

    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    pub fn battery(&self) -> Option<BatteryStatus> {
        self.battery
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        if self.expanded != expanded {
            self.expanded = expanded;
            self.invalidate(Field::Expanded);
        }
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        if self.pinned != pinned {
            self.pinned = pinned;
            self.invalidate(Field::Pinned);
        }
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        if self.hovering != hovering {
            self.hovering = hovering;
            self.invalidate(Field::Hovering);
        }
    }

    pub fn set_indicator_visible(&mut self, visible: bool) {
        if self.indicator_visible != visible {
            self.indicator_visible = visible;
            self.invalidate(Field::IndicatorVisible);
        }
    }

    pub fn set_selected_tab(&mut self, tab: NotchTab) {
        if self.selected_tab != tab {
            self.selected_tab = tab;
            self.invalidate(Field::SelectedTab);
        }
    }

    pub fn set_clock_text(&mut self, text: String) {
        if self.clock_text != text {
            self.clock_text = text;
            self.invalidate(Field::Clock);
        }
    }

    pub fn set_battery(&mut self, battery: Option<BatteryStatus>) {
        if self.battery != battery {
            self.battery = battery;
            self.invalidate(Field::Battery);
        }
    }

    /// Marks every view that depends on `field`. List-holding managers call
    /// this through the shell after a load/remove/clear.
    pub fn invalidate(&mut self, field: Field) {
        for &view in dependents(field) {
            self.dirty.mark(view);
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Hands the current dirty set to the renderer and resets it.
    pub fn take_dirty(&mut self) -> DirtySet {
        let taken = self.dirty;
        self.dirty.clear();
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setter_marks_dependent_views() {
        let mut state = NotchState::default();
        state.set_pinned(true);

        let dirty = state.take_dirty();
        assert!(dirty.contains(ViewId::Header));
        assert!(!dirty.contains(ViewId::MediaPanel));
    }

    #[test]
    fn unchanged_setter_marks_nothing() {
        let mut state = NotchState::default();
        state.set_pinned(false);
        assert!(!state.is_dirty());
    }

    #[test]
    fn expanded_invalidates_every_view() {
        let mut state = NotchState::default();
        state.set_expanded(true);

        let dirty = state.take_dirty();
        for view in ViewId::ALL {
            assert!(dirty.contains(view));
        }
    }

    #[test]
    fn take_dirty_resets_the_set() {
        let mut state = NotchState::default();
        state.set_clock_text("09:41".to_string());
        assert!(state.is_dirty());

        let _ = state.take_dirty();
        assert!(!state.is_dirty());
    }

    #[test]
    fn list_invalidation_targets_one_panel() {
        let mut state = NotchState::default();
        state.invalidate(Field::TrayFiles);

        let dirty = state.take_dirty();
        assert!(dirty.contains(ViewId::TrayPanel));
        assert!(!dirty.contains(ViewId::CalendarPanel));
    }

    #[test]
    fn default_tab_is_media() {
        assert_eq!(NotchTab::default(), NotchTab::Media);
    }
}
