pub use trade_copier_broker::error::BrokerSessionError;
pub use trade_copier_domain::donor_source::DonorSourceError;
