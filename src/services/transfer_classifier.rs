//! Transfer classification rules.
//!
//! Pure functions over normalized transaction data: balance-delta extraction,
//! intent tagging and the suspicion heuristic. No network access here.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::chain::{SignatureInfo, TransactionDetail};
use crate::models::transfer::{TransferEvent, TransferKind};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const SOL_SYMBOL: &str = "SOL";
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const JUPITER_V6_PROGRAM: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
pub const JUPITER_V4_PROGRAM: &str = "JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB";
pub const STAKE_PROGRAM: &str = "Stake11111111111111111111111111111111111111";

/// Any transfer above this many SOL is suspicious
pub const SUSPICIOUS_AMOUNT_SOL: Decimal = dec!(1000);

/// Busy transactions (more instructions than this) are suspicious above
/// `BUSY_SUSPICIOUS_AMOUNT_SOL`
pub const BUSY_INSTRUCTION_COUNT: usize = 5;
pub const BUSY_SUSPICIOUS_AMOUNT_SOL: Decimal = dec!(500);

/// Program ids that decide a transaction's intent
#[derive(Debug, Clone)]
pub struct ProgramCatalog {
    pub swap_programs: Vec<String>,
    pub stake_programs: Vec<String>,
}

impl Default for ProgramCatalog {
    fn default() -> Self {
        Self {
            swap_programs: vec![JUPITER_V6_PROGRAM.to_string(), JUPITER_V4_PROGRAM.to_string()],
            stake_programs: vec![STAKE_PROGRAM.to_string()],
        }
    }
}

/// Largest absolute per-account lamport change
pub fn largest_balance_delta(pre: &[u64], post: &[u64]) -> u64 {
    pre.iter()
        .zip(post.iter())
        .map(|(before, after)| before.abs_diff(*after))
        .max()
        .unwrap_or(0)
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// The first instruction hitting a known swap or stake program decides the
/// intent; everything else is a plain transfer.
pub fn classify_intent<'a, I>(program_ids: I, catalog: &ProgramCatalog) -> TransferKind
where
    I: IntoIterator<Item = &'a str>,
{
    for program_id in program_ids {
        if catalog.swap_programs.iter().any(|p| p == program_id) {
            return TransferKind::Swap;
        }
        if catalog.stake_programs.iter().any(|p| p == program_id) {
            return TransferKind::Stake;
        }
    }
    TransferKind::Transfer
}

/// amount > 1000, or more than 5 instructions and amount > 500
pub fn is_suspicious(amount_sol: Decimal, instruction_count: usize) -> bool {
    amount_sol > SUSPICIOUS_AMOUNT_SOL
        || (instruction_count > BUSY_INSTRUCTION_COUNT && amount_sol > BUSY_SUSPICIOUS_AMOUNT_SOL)
}

/// Inputs shared by every transaction of one scan
#[derive(Debug, Clone, Copy)]
pub struct ClassificationContext<'a> {
    pub threshold_lamports: u64,
    pub sol_price: Decimal,
    pub current_slot: u64,
    pub now: i64,
    pub catalog: &'a ProgramCatalog,
}

/// Turn one fetched transaction into a TransferEvent, or `None` when it
/// failed on chain or moved less than the threshold.
pub fn evaluate_transaction(
    wallet: &str,
    signature: &SignatureInfo,
    tx: &TransactionDetail,
    ctx: &ClassificationContext<'_>,
) -> Option<TransferEvent> {
    if tx.failed() {
        return None;
    }
    let meta = tx.meta.as_ref()?;

    let max_delta = largest_balance_delta(&meta.pre_balances, &meta.post_balances);
    if max_delta < ctx.threshold_lamports {
        return None;
    }

    let amount = lamports_to_sol(max_delta);
    let instructions = tx.instructions();
    let kind = classify_intent(
        instructions.iter().map(|ix| ix.program_id.as_str()),
        ctx.catalog,
    );

    Some(TransferEvent {
        signature: signature.signature.clone(),
        wallet_address: wallet.to_string(),
        transaction_type: kind,
        amount: amount.round_dp(4),
        token_symbol: SOL_SYMBOL.to_string(),
        token_mint: SOL_MINT.to_string(),
        usd_value: (amount * ctx.sol_price).round_dp(2),
        timestamp: signature.block_time.or(tx.block_time).unwrap_or(ctx.now),
        block_number: signature.slot.or(tx.slot).unwrap_or(ctx.current_slot),
        is_suspicious: is_suspicious(amount, instructions.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chain::{
        Instruction, TransactionBody, TransactionMessage, TransactionMeta,
    };

    fn tx(pre: Vec<u64>, post: Vec<u64>, programs: &[&str]) -> TransactionDetail {
        TransactionDetail {
            slot: Some(99),
            block_time: Some(1_700_000_100),
            meta: Some(TransactionMeta {
                err: None,
                pre_balances: pre,
                post_balances: post,
                ..Default::default()
            }),
            transaction: Some(TransactionBody {
                message: TransactionMessage {
                    instructions: programs
                        .iter()
                        .map(|p| Instruction {
                            program_id: p.to_string(),
                        })
                        .collect(),
                },
            }),
        }
    }

    fn sig(name: &str) -> SignatureInfo {
        SignatureInfo {
            signature: name.to_string(),
            slot: Some(250_000_000),
            block_time: Some(1_700_000_000),
            err: None,
        }
    }

    #[test]
    fn test_suspicious_large_amount_boundary() {
        assert!(!is_suspicious(dec!(1000), 0));
        assert!(is_suspicious(dec!(1000.0001), 0));
        assert!(is_suspicious(dec!(5000), 1));
    }

    #[test]
    fn test_suspicious_busy_transaction_boundary() {
        // exactly 500 with many instructions is not enough
        assert!(!is_suspicious(dec!(500), 6));
        assert!(is_suspicious(dec!(500.0001), 6));
        // exactly 5 instructions is not "busy"
        assert!(!is_suspicious(dec!(600), 5));
        assert!(is_suspicious(dec!(600), 6));
    }

    #[test]
    fn test_largest_balance_delta() {
        assert_eq!(largest_balance_delta(&[10, 500, 7], &[20, 100, 7]), 400);
        assert_eq!(largest_balance_delta(&[], &[]), 0);
        // Unpaired trailing entries are ignored
        assert_eq!(largest_balance_delta(&[1, 1_000_000], &[2]), 1);
    }

    #[test]
    fn test_classify_intent() {
        let catalog = ProgramCatalog::default();
        assert_eq!(
            classify_intent(["11111111111111111111111111111111", JUPITER_V6_PROGRAM], &catalog),
            TransferKind::Swap
        );
        assert_eq!(classify_intent([STAKE_PROGRAM], &catalog), TransferKind::Stake);
        assert_eq!(
            classify_intent([STAKE_PROGRAM, JUPITER_V4_PROGRAM], &catalog),
            TransferKind::Stake
        );
        assert_eq!(classify_intent([], &catalog), TransferKind::Transfer);
    }

    #[test]
    fn test_evaluate_accepts_whale_and_derives_fields() {
        let catalog = ProgramCatalog::default();
        let ctx = ClassificationContext {
            threshold_lamports: 100 * LAMPORTS_PER_SOL,
            sol_price: dec!(150),
            current_slot: 1,
            now: 0,
            catalog: &catalog,
        };

        let detail = tx(
            vec![1_500 * LAMPORTS_PER_SOL, 0],
            vec![300 * LAMPORTS_PER_SOL, 1_200 * LAMPORTS_PER_SOL],
            &[JUPITER_V6_PROGRAM],
        );
        let event = evaluate_transaction("wallet-1", &sig("sig-1"), &detail, &ctx).unwrap();

        assert_eq!(event.amount, dec!(1200));
        assert_eq!(event.usd_value, dec!(180000));
        assert_eq!(event.transaction_type, TransferKind::Swap);
        assert!(event.is_suspicious);
        assert_eq!(event.block_number, 250_000_000);
        assert_eq!(event.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_evaluate_threshold_is_inclusive() {
        let catalog = ProgramCatalog::default();
        let ctx = ClassificationContext {
            threshold_lamports: 100 * LAMPORTS_PER_SOL,
            sol_price: dec!(50),
            current_slot: 1,
            now: 0,
            catalog: &catalog,
        };

        let exact = tx(vec![100 * LAMPORTS_PER_SOL], vec![0], &[]);
        let event = evaluate_transaction("w", &sig("exact"), &exact, &ctx).unwrap();
        assert_eq!(event.amount, dec!(100));
        assert!(!event.is_suspicious);

        let below = tx(vec![100 * LAMPORTS_PER_SOL - 1], vec![0], &[]);
        assert!(evaluate_transaction("w", &sig("below"), &below, &ctx).is_none());
    }

    #[test]
    fn test_evaluate_skips_failed_transaction() {
        let catalog = ProgramCatalog::default();
        let ctx = ClassificationContext {
            threshold_lamports: 1,
            sol_price: dec!(50),
            current_slot: 1,
            now: 0,
            catalog: &catalog,
        };

        let mut failed = tx(vec![5_000 * LAMPORTS_PER_SOL], vec![0], &[]);
        if let Some(meta) = failed.meta.as_mut() {
            meta.err = Some(serde_json::json!({"InstructionError": [0, "Custom"]}));
        }
        assert!(evaluate_transaction("w", &sig("failed"), &failed, &ctx).is_none());
    }
}
