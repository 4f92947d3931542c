use lazy_static::lazy_static;
use prometheus::IntCounter;
use prometheus::IntGauge;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;


lazy_static! {
    /// One series per policy, labelled with `TranslogDeletionPolicy::metrics_label`
    pub static ref TRANSLOG_MIN_GEN_REQUIRED: IntGaugeVec = IntGaugeVec::new(
        Opts::new(
            "translog_min_gen_required",
            "Lowest translog generation that must be retained, as of the last computation"
        ),
        &["translog"]
    )
    .expect("metric can not be created");

    pub static ref TRANSLOG_GEN_LEASES: IntGauge = IntGauge::new(
        "translog_gen_leases",
        "Outstanding translog generation leases"
    )
    .expect("metric can not be created");

    pub static ref TRANSLOG_LEASE_REJECTED: IntCounter = IntCounter::new(
        "translog_lease_rejected",
        "Lease requests rejected because the generation does not exist yet"
    )
    .expect("metric can not be created");
}

/// Registers the translog collectors with `registry`.
pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(TRANSLOG_MIN_GEN_REQUIRED.clone()))?;
    registry.register(Box::new(TRANSLOG_GEN_LEASES.clone()))?;
    registry.register(Box::new(TRANSLOG_LEASE_REJECTED.clone()))?;
    Ok(())
}
