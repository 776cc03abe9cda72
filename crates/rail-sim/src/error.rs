use rail_track::LayoutError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("train {train:?} references unknown track {label:?}")]
    UnknownTrack { train: String, label: String },

    #[error("duplicate train name {0:?}")]
    DuplicateTrain(String),

    #[error("train {train:?} cannot start on track {label:?}: entry block already granted to {holder:?}")]
    EntryTaken {
        train:  String,
        label:  String,
        holder: String,
    },
}

pub type SimResult<T> = Result<T, SimError>;
