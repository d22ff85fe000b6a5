/// A player's lifecycle state, stored as the first word of its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unavailable = 0,
    Idle = 1,
    Playing = 2,
    Done = 3,
}

impl PlayerState {
    pub fn as_word(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for PlayerState {
    type Error = u32;

    fn try_from(word: u32) -> Result<Self, u32> {
        match word {
            0 => Ok(Self::Unavailable),
            1 => Ok(Self::Idle),
            2 => Ok(Self::Playing),
            3 => Ok(Self::Done),
            other => Err(other),
        }
    }
}
