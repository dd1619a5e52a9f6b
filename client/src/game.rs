use shared::{EnemyRecord, LaserRecord, MatchState, PlayerView, Slot, TickUpdate};
use std::net::SocketAddr;

// Which screen the client shows for the latest state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    WaitingForOpponent,
    Lobby,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

// Client-side view of the match, rebuilt from every server update
pub struct ClientGameState {
    identity: SocketAddr,
    pub slot: Option<Slot>,
    pub state: MatchState,
    pub own_lasers: Vec<LaserRecord>,
    pub opponent_lasers: Vec<LaserRecord>,
    pub enemies: Vec<EnemyRecord>,
    pub screen: Screen,
    pub outcome: Option<Outcome>,
    pub updates: u64,
}

impl ClientGameState {
    pub fn new(identity: SocketAddr) -> Self {
        Self {
            identity,
            slot: None,
            state: MatchState::default(),
            own_lasers: Vec::new(),
            opponent_lasers: Vec::new(),
            enemies: Vec::new(),
            screen: Screen::WaitingForOpponent,
            outcome: None,
            updates: 0,
        }
    }

    pub fn identity(&self) -> SocketAddr {
        self.identity
    }

    // Takes in a server update. Returns the new screen if it changed.
    pub fn apply_update(&mut self, update: TickUpdate) -> Option<Screen> {
        self.slot = update.state.slot_of(self.identity);
        self.state = update.state;
        self.own_lasers = update.own_lasers;
        self.opponent_lasers = update.opponent_lasers;
        self.enemies = update.enemies;
        self.updates += 1;

        if let Some(outcome) = self.read_outcome() {
            self.outcome = Some(outcome);
        }

        let screen = if self.state.any_slot_empty() {
            Screen::WaitingForOpponent
        } else if self.state.ready {
            Screen::Playing
        } else {
            Screen::Lobby
        };

        if screen == self.screen {
            return None;
        }

        // A fresh match or an opponent leaving wipes the last result
        if screen != Screen::Lobby {
            self.outcome = None;
        }
        self.screen = screen;
        Some(screen)
    }

    fn read_outcome(&self) -> Option<Outcome> {
        let slot = self.slot?;
        let (me, opponent) = (self.state.player(slot), self.state.player(slot.other()));
        if me.win || opponent.lost {
            Some(Outcome::Won)
        } else if opponent.win || me.lost {
            Some(Outcome::Lost)
        } else {
            None
        }
    }

    pub fn me(&self) -> Option<PlayerView> {
        self.slot.map(|slot| self.state.player(slot))
    }

    pub fn opponent(&self) -> Option<PlayerView> {
        self.slot.map(|slot| self.state.player(slot.other()))
    }

    // True while the current round is decided but not yet reset
    pub fn round_over(&self) -> bool {
        self.state.any_lost()
    }

    pub fn level_label(&self) -> String {
        format!("Level: {}", self.state.level)
    }

    pub fn banner(&self) -> Option<&'static str> {
        match (self.screen, self.outcome) {
            (Screen::Playing, _) => None,
            (Screen::WaitingForOpponent, _) => {
                Some("Waiting for another player...(1 online player)")
            }
            (Screen::Lobby, Some(Outcome::Lost)) => Some("You Lost!!!, Press space to ready again"),
            (Screen::Lobby, Some(Outcome::Won)) => Some("You Won!!!, Press space to ready again"),
            (Screen::Lobby, None) => Some("Press space to ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::SlotAddr;

    fn me() -> SocketAddr {
        "127.0.0.1:6001".parse().unwrap()
    }

    fn them() -> SocketAddr {
        "127.0.0.1:6002".parse().unwrap()
    }

    fn update(f: impl FnOnce(&mut MatchState)) -> TickUpdate {
        let mut state = MatchState::default();
        state.set_user(Slot::One, SlotAddr(Some(them())));
        state.set_user(Slot::Two, SlotAddr(Some(me())));
        f(&mut state);
        TickUpdate {
            state,
            own_lasers: Vec::new(),
            opponent_lasers: Vec::new(),
            enemies: Vec::new(),
        }
    }

    #[test]
    fn test_detects_own_slot() {
        let mut view = ClientGameState::new(me());
        assert_eq!(view.apply_update(update(|_| {})), Some(Screen::Lobby));

        assert_eq!(view.slot, Some(Slot::Two));
        assert_eq!(view.me().unwrap().x, view.state.x2);
        assert_eq!(view.opponent().unwrap().x, view.state.x1);
        assert_eq!(view.banner(), Some("Press space to ready"));
    }

    #[test]
    fn test_waiting_screen_when_slot_empty() {
        let mut view = ClientGameState::new(me());
        let changed = view.apply_update(update(|s| s.set_user(Slot::One, SlotAddr::EMPTY)));

        assert_eq!(changed, None);
        assert_eq!(view.screen, Screen::WaitingForOpponent);
        assert!(view.banner().unwrap().starts_with("Waiting"));
    }

    #[test]
    fn test_playing_then_lost() {
        let mut view = ClientGameState::new(me());
        assert_eq!(
            view.apply_update(update(|s| s.ready = true)),
            Some(Screen::Playing)
        );
        assert_eq!(view.banner(), None);

        view.apply_update(update(|s| {
            s.ready = true;
            s.lost2 = true;
            s.win1 = true;
        }));
        assert!(view.round_over());
        assert_eq!(view.outcome, Some(Outcome::Lost));

        // Reset keeps only the winner's flag.
        let changed = view.apply_update(update(|s| s.win1 = true));
        assert_eq!(changed, Some(Screen::Lobby));
        assert_eq!(view.outcome, Some(Outcome::Lost));
        assert_eq!(view.banner(), Some("You Lost!!!, Press space to ready again"));

        view.apply_update(update(|s| s.ready = true));
        assert_eq!(view.outcome, None);
    }

    #[test]
    fn test_win_banner() {
        let mut view = ClientGameState::new(me());
        view.apply_update(update(|s| s.win2 = true));
        assert_eq!(view.outcome, Some(Outcome::Won));
        assert_eq!(view.banner(), Some("You Won!!!, Press space to ready again"));
    }

    #[test]
    fn test_level_label() {
        let mut view = ClientGameState::new(me());
        view.apply_update(update(|s| s.level = 4));
        assert_eq!(view.level_label(), "Level: 4");
        assert_eq!(view.updates, 1);
    }
}
