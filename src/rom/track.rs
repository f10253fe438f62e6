//! The game's track slots

use serde::Serialize;
use std::collections::HashMap;
use std::{fmt, str};

pub const TRACK_COUNT: usize = 33;

/// Every track slot of the game, in table order.
#[derive(Copy, Clone, Serialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackName {
    FlashMan,
    WoodMan,
    CrashMan,
    HeatMan,
    AirMan,
    MetalMan,
    QuickMan,
    BubbleMan,
    Wily1,
    Wily3,
    StageSelected,
    Boss,
    StageSelect,
    Title,
    Intro,
    GameOver,
    Password,
    WilyCastle,
    WilyCapsule,
    Ending,
    Credits,
    StageClear,
    GameClear,
    GetWeapon,
    Wily2,
    Wily4,
    Wily5,
    Wily6,
    Track1c,
    Track1d,
    Track1e,
    Track1f,
    Track20,
}

const ALL_TRACKS: [TrackName; TRACK_COUNT] = {
    use TrackName::*;

    [
        FlashMan,
        WoodMan,
        CrashMan,
        HeatMan,
        AirMan,
        MetalMan,
        QuickMan,
        BubbleMan,
        Wily1,
        Wily3,
        StageSelected,
        Boss,
        StageSelect,
        Title,
        Intro,
        GameOver,
        Password,
        WilyCastle,
        WilyCapsule,
        Ending,
        Credits,
        StageClear,
        GameClear,
        GetWeapon,
        Wily2,
        Wily4,
        Wily5,
        Wily6,
        Track1c,
        Track1d,
        Track1e,
        Track1f,
        Track20,
    ]
};

lazy_static! {
    static ref TRACKS_BY_NAME: HashMap<String, TrackName> = ALL_TRACKS
        .iter()
        .map(|track| (track.friendly_name().to_ascii_lowercase(), *track))
        .collect();
}

impl TrackName {
    /// Iterate all track slots in table order.
    pub fn iter() -> impl Iterator<Item = TrackName> {
        ALL_TRACKS.iter().copied()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        ALL_TRACKS.get(index).copied()
    }

    /// Position of the slot in both track tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Yield the name this slot goes by in project files.
    pub fn friendly_name(self) -> &'static str {
        use TrackName::*;

        match self {
            FlashMan => "FlashMan",
            WoodMan => "WoodMan",
            CrashMan => "CrashMan",
            HeatMan => "HeatMan",
            AirMan => "AirMan",
            MetalMan => "MetalMan",
            QuickMan => "QuickMan",
            BubbleMan => "BubbleMan",
            Wily1 => "Wily1",
            Wily3 => "Wily3",
            StageSelected => "StageSelected",
            Boss => "Boss",
            StageSelect => "StageSelect",
            Title => "Title",
            Intro => "Intro",
            GameOver => "GameOver",
            Password => "Password",
            WilyCastle => "WilyCastle",
            WilyCapsule => "WilyCapsule",
            Ending => "Ending",
            Credits => "Credits",
            StageClear => "StageClear",
            GameClear => "GameClear",
            GetWeapon => "GetWeapon",
            Wily2 => "Wily2",
            Wily4 => "Wily4",
            Wily5 => "Wily5",
            Wily6 => "Wily6",
            Track1c => "Track1c",
            Track1d => "Track1d",
            Track1e => "Track1e",
            Track1f => "Track1f",
            Track20 => "Track20",
        }
    }
}

impl fmt::Display for TrackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.friendly_name())
    }
}

impl str::FromStr for TrackName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TRACKS_BY_NAME
            .get(&s.to_ascii_lowercase())
            .copied()
            .ok_or(())
    }
}

derive_deserialize_from_str!(TrackName, "valid track name");
