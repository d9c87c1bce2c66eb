//! Side effects the state machines hand back to their host: sounds to play
//! and pages to navigate to.

use serde::{Deserialize, Serialize};

use crate::util::clamp_volume;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sound {
    DoorClick,
    Clap,
    Applause,
}

impl Sound {
    pub fn asset_path(&self) -> &'static str {
        match self {
            Sound::DoorClick => "assets/audio/door-click.mp3",
            Sound::Clap | Sound::Applause => "assets/audio/clap.mp3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AudioCue {
    Play { sound: Sound, volume: f32, looped: bool },
    Stop(Sound),
}

impl AudioCue {
    pub fn play(sound: Sound, volume: f32) -> Self {
        AudioCue::Play {
            sound,
            volume: clamp_volume(volume),
            looped: false,
        }
    }

    pub fn looped(sound: Sound, volume: f32) -> Self {
        AudioCue::Play {
            sound,
            volume: clamp_volume(volume),
            looped: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Entry,
    Transition,
    Welcome,
    Rooms,
}

impl Page {
    pub fn file_name(&self) -> &'static str {
        match self {
            Page::Entry => "index.html",
            Page::Transition => "transition.html",
            Page::Welcome => "quote.html",
            Page::Rooms => "rooms.html",
        }
    }
}
