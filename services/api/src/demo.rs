use std::path::PathBuf;

use clap::Args;
use organ_trust::error::AppError;
use organ_trust::workflows::directory::{DonorId, EntityId, RecipientId};
use organ_trust::workflows::matching::{MatchFilter, MatchRecord};
use organ_trust::workflows::review::{Actor, ActorRole, AuditStatus, ReviewState};
use organ_trust::workflows::risk::RiskTier;

use crate::infra::{load_seed, Services};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed the in-memory directory from this CSV instead of the built-in records
    #[arg(long)]
    pub(crate) directory_csv: Option<PathBuf>,
    /// Print every ledger entry recorded during the walkthrough
    #[arg(long)]
    pub(crate) show_ledger: bool,
}

const FRAUD_REASON: &str = "accreditation number does not match the national registry";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let seed = load_seed(args.directory_csv.as_deref())?;
    let services = Services::from_seed(&seed);
    let reviewer = Actor::new("admin-demo", ActorRole::Admin);

    println!("Organ matching and trust scoring demo");

    let donors: Vec<DonorId> = seed.donors.iter().map(|donor| donor.id.clone()).collect();
    let recipients: Vec<RecipientId> = seed
        .recipients
        .iter()
        .map(|recipient| recipient.id.clone())
        .collect();

    println!(
        "\nGenerating matches for {} donors and {} recipients",
        donors.len(),
        recipients.len()
    );
    let matches = match services.matching.generate_matches(&donors, &recipients) {
        Ok(matches) => matches,
        Err(err) => {
            println!("  Match generation failed: {err}");
            return Ok(());
        }
    };
    for record in &matches {
        render_match(record);
    }

    review_matches(&services, &matches, &reviewer);

    match services.matching.list_matches(&MatchFilter::default()) {
        Ok(listed) => {
            println!("\nMatch board");
            for record in listed {
                println!(
                    "  - {} {} -> {} [{}] {}",
                    record.id,
                    record.donor_name,
                    record.recipient_name,
                    record.organ,
                    record.status.label()
                );
            }
        }
        Err(err) => println!("  Listing unavailable: {err}"),
    }

    println!("\nHospital onboarding and risk checks");
    for hospital in &seed.hospitals {
        check_hospital(&services, &hospital.id, &reviewer);
    }

    let pending = services.onboarding.pending(usize::MAX).unwrap_or_default();
    println!("\nVerification requests still pending: {}", pending.len());
    for request in pending {
        println!("  - {} for {}", request.id, request.subject_name);
    }

    let notices = services.notifier.notices();
    println!("\nNotifications published: {}", notices.len());
    for notice in &notices {
        println!("  - {} ({})", notice.template, notice.subject_id);
    }

    let events = services.ledger.events();
    println!("\nLedger entries recorded: {}", events.len());
    if args.show_ledger {
        for event in events {
            println!(
                "  - {} {:?}: {} -> {} by {}{}",
                event.timestamp.format("%H:%M:%S"),
                event.kind,
                event.from_state,
                event.to_state,
                event.actor,
                event
                    .reason
                    .map(|reason| format!(" ({reason})"))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn render_match(record: &MatchRecord) {
    println!(
        "- {}: {} -> {} | {} | score {} (blood {}, organ {}) | success {} | {}",
        record.id,
        record.donor_name,
        record.recipient_name,
        record.organ,
        record.compatibility_score,
        record.blood_component,
        record.organ_component,
        record.predicted_success.label(),
        record.recommendation.label()
    );
    for reason in &record.reasons {
        println!("    * {reason}");
    }
}

fn review_matches(services: &Services, matches: &[MatchRecord], reviewer: &Actor) {
    let Some(best) = matches.iter().max_by_key(|record| record.compatibility_score) else {
        return;
    };

    println!("\nReviewing matches");
    match services.matching.approve(&best.id, reviewer) {
        Ok(review) => println!(
            "  Approved {} ({} -> {}), audit {}{}",
            review.record.id,
            review.receipt.from,
            review.receipt.to,
            review.receipt.audit.label(),
            if review.donor_newly_matched {
                ", donor now matched"
            } else {
                ""
            }
        ),
        Err(err) => println!("  Approval failed: {err}"),
    }

    if let Err(err) = services.matching.approve(&best.id, reviewer) {
        println!("  Second approval refused: {err}");
    }

    for record in matches.iter().filter(|record| record.compatibility_score <= 50) {
        match services.matching.reject(
            &record.id,
            reviewer,
            Some("organ type mismatch".to_string()),
        ) {
            Ok(review) => println!("  Rejected {} ({})", review.record.id, review.receipt.to),
            Err(err) => println!("  Rejection failed for {}: {err}", record.id),
        }
    }
}

fn check_hospital(services: &Services, id: &EntityId, reviewer: &Actor) {
    if let Err(err) = services.onboarding.apply(id) {
        println!("  - {id}: onboarding unavailable ({err})");
        return;
    }

    let assessment = match services.risk.check_risk(id) {
        Ok(assessment) => assessment,
        Err(err) => {
            println!("  - {id}: risk check failed ({err})");
            return;
        }
    };
    println!(
        "  - {} {}: risk score {} ({})",
        assessment.id,
        assessment.entity_name,
        assessment.score,
        assessment.tier.label()
    );

    if assessment.tier < RiskTier::High {
        return;
    }
    match services.risk.report_fraud(id, FRAUD_REASON, reviewer) {
        Ok(receipt) => {
            println!("    Fraud report filed (audit {})", receipt.audit.label());
            if let AuditStatus::Degraded { reason, .. } = &receipt.audit {
                println!("    Ledger write pending retry: {reason}");
            }
            if let Some(request) = receipt.rejected_verification {
                println!("    Onboarding request {request} rejected");
            }
        }
        Err(err) => println!("    Fraud report refused: {err}"),
    }
}
