use quadfund_core::PricingError;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Please connect your wallet first")]
    NotConnected,
    #[error("payment target is missing {0}")]
    InvalidTarget(&'static str),
    #[error("a vote is already waiting on the wallet")]
    Busy,
    #[error("vote selector is not open")]
    SelectorClosed,
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
