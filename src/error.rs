use crate::grid::Position;
use crate::powerup::PowerUpKind;
use thiserror::Error;

/// Broad class of a refused operation. None of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InsufficientResource,
    PreconditionViolation,
}

/// Why an operation was not allowed in the current engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("game is paused")]
    Paused,
    #[error("level is over")]
    LevelOver,
    #[error("no moves left")]
    OutOfMoves,
    #[error("{0} is armed; pick a target or cancel it")]
    PowerUpArmed(PowerUpKind),
    #[error("no power-up is armed")]
    NothingArmed,
    #[error("level is not complete")]
    LevelNotComplete,
    #[error("level is already complete")]
    NotInLevel,
}

/// Every refusal the engine can return. State is unchanged whenever one comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("position {0} is off the grid")]
    OutOfBounds(Position),
    #[error("cannot swap {0} with itself")]
    SameCell(Position),
    #[error("{0} and {1} are not adjacent")]
    NotAdjacent(Position, Position),
    #[error("no {0} left")]
    NoPowerUp(PowerUpKind),
    #[error("need {needed} coins, have {available}")]
    NotEnoughCoins { needed: u32, available: u32 },
    #[error(transparent)]
    Precondition(#[from] Precondition),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfBounds(_) | Self::SameCell(_) | Self::NotAdjacent(..) => {
                ErrorKind::InvalidInput
            }
            Self::NoPowerUp(_) | Self::NotEnoughCoins { .. } => ErrorKind::InsufficientResource,
            Self::Precondition(_) => ErrorKind::PreconditionViolation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let p = Position::new(0, 0);
        assert_eq!(EngineError::SameCell(p).kind(), ErrorKind::InvalidInput);
        assert_eq!(
            EngineError::NotEnoughCoins { needed: 100, available: 5 }.kind(),
            ErrorKind::InsufficientResource
        );
        assert_eq!(
            EngineError::from(Precondition::Paused).kind(),
            ErrorKind::PreconditionViolation
        );
    }

    #[test]
    fn test_messages() {
        let err = EngineError::NotAdjacent(Position::new(0, 0), Position::new(2, 2));
        assert_eq!(err.to_string(), "(0, 0) and (2, 2) are not adjacent");
        let err = EngineError::from(Precondition::PowerUpArmed(PowerUpKind::Bomb));
        assert_eq!(err.to_string(), "bomb is armed; pick a target or cancel it");
    }
}
