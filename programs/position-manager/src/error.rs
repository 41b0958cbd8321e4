use anchor_lang::prelude::*;

#[error_code(offset = 6100)]
pub enum ErrorCode {
    #[msg("Price slippage check")]
    PriceSlippageCheck,

    #[msg("Not approved")]
    NotApproved,

    // Half width must be a positive multiple of the pool's tick spacing
    #[msg("Invalid range width")]
    InvalidRangeWidth,

    // Tokens paid for a failed mint could not be returned to the payer
    #[msg("Refund failed")]
    RefundFailed,
}
