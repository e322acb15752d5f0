//! [`Stage`]: the ordinal steps of the matcher pipeline (spec.md §4.F).

use thiserror::Error;

/// One ordinal step of the matcher pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Not yet entered.
    Nil = 0,
    MidpointBuyPriceExp = 1,
    MidpointBuyPriceCo = 2,
    MidpointSellPriceExp = 3,
    MidpointSellPriceCo = 4,
    PriceExp = 5,
    PriceCo = 6,
    BuyVolumeExp = 7,
    BuyVolumeCo = 8,
    SellVolumeExp = 9,
    SellVolumeCo = 10,
    Tokens = 11,
    /// Admission guard; never visited as a pipeline stage in its own right.
    Settlement = 12,
}

/// A stage ordinal byte did not correspond to any known [`Stage`].
#[derive(Debug, Error)]
#[error("unknown stage ordinal: {0}")]
pub struct UnknownStage(pub u8);

impl Stage {
    /// The ordinal byte stored in a [`darkpool_types::JoinId`].
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Recovers a `Stage` from its ordinal byte.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, UnknownStage> {
        Ok(match ordinal {
            0 => Stage::Nil,
            1 => Stage::MidpointBuyPriceExp,
            2 => Stage::MidpointBuyPriceCo,
            3 => Stage::MidpointSellPriceExp,
            4 => Stage::MidpointSellPriceCo,
            5 => Stage::PriceExp,
            6 => Stage::PriceCo,
            7 => Stage::BuyVolumeExp,
            8 => Stage::BuyVolumeCo,
            9 => Stage::SellVolumeExp,
            10 => Stage::SellVolumeCo,
            11 => Stage::Tokens,
            12 => Stage::Settlement,
            other => return Err(UnknownStage(other)),
        })
    }

    /// The stage one position "down" in the same Exp/Co pair (e.g.
    /// `PriceExp` -> `PriceCo`). Only meaningful for the three Exp stages
    /// that have a paired Co stage.
    pub(crate) fn descend(self) -> Stage {
        Stage::from_ordinal(self.ordinal() + 1).expect("descend is only called on paired stages")
    }

    /// The stage two positions ahead, skipping the paired Co stage (e.g.
    /// `PriceExp` -> `BuyVolumeExp`).
    pub(crate) fn skip_co(self) -> Stage {
        Stage::from_ordinal(self.ordinal() + 2).expect("skip_co is only called on paired stages")
    }
}
