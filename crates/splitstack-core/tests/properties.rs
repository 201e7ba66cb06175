use chrono::Utc;
use proptest::prelude::*;
use splitstack_core::{
    compute_net_balances, compute_split, consolidate_debts, LineItem, Money, Participant, Receipt,
    Roster, SharedLineItem,
};

const MAX_MEMBERS: usize = 5;

#[derive(Debug, Clone)]
struct ReceiptPlan {
    payer: usize,
    items: Vec<(usize, i64)>,
    shared: Vec<(i64, u8)>,
    taxes: i64,
    tip: i64,
}

fn roster_of(size: usize) -> Roster {
    Roster::new((0..size).map(|i| format!("p{i}"))).unwrap()
}

fn receipt_plan() -> impl Strategy<Value = ReceiptPlan> {
    (
        0usize..MAX_MEMBERS,
        prop::collection::vec((0usize..MAX_MEMBERS, 1i64..=50_000), 1..=6),
        prop::collection::vec((1i64..=30_000, any::<u8>()), 0..=3),
        0i64..=5_000,
        0i64..=5_000,
    )
        .prop_map(|(payer, items, shared, taxes, tip)| ReceiptPlan {
            payer,
            items,
            shared,
            taxes,
            tip,
        })
}

/// Items only: no shared items, taxes or tip. Prices start at two cents so
/// every non-zero split is above the settlement threshold.
fn plain_plan() -> impl Strategy<Value = ReceiptPlan> {
    (
        0usize..MAX_MEMBERS,
        prop::collection::vec((0usize..MAX_MEMBERS, 2i64..=50_000), 1..=6),
    )
        .prop_map(|(payer, items)| ReceiptPlan {
            payer,
            items,
            shared: Vec::new(),
            taxes: 0,
            tip: 0,
        })
}

fn draft(roster: &Roster, plan: &ReceiptPlan) -> Receipt {
    let members = roster.members();
    let n = members.len();
    let payer = members[plan.payer % n].clone();

    let mut receipt = Receipt::new(roster, Utc::now());
    receipt.set_subject("Generated").unwrap();

    for (who, cents) in &plan.items {
        let item = LineItem::new("item", Money::from_cents(*cents)).unwrap();
        receipt.add_individual_item(&members[who % n], item).unwrap();
    }

    for (cents, mask) in &plan.shared {
        let mut participants: Vec<Participant> = members
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1u8 << i) != 0)
            .map(|(_, p)| p.clone())
            .collect();
        if participants.is_empty() {
            participants.push(payer.clone());
        }
        let item = SharedLineItem::new("shared", Money::from_cents(*cents), participants).unwrap();
        receipt.add_shared_item(item).unwrap();
    }

    receipt.set_taxes(Money::from_cents(plan.taxes)).unwrap();
    receipt.set_tip(Money::from_cents(plan.tip)).unwrap();
    receipt.set_payer(Some(payer)).unwrap();
    receipt
}

fn completed(roster: &Roster, plan: &ReceiptPlan) -> Receipt {
    let mut receipt = draft(roster, plan);
    receipt.finalize(Utc::now()).unwrap();
    receipt
}

fn rounding_surplus(receipt: &Receipt) -> Money {
    receipt.splits().values().copied().sum::<Money>() - receipt.total().unwrap()
}

proptest! {
    #[test]
    fn plain_receipts_split_to_item_sums(
        size in 1usize..=MAX_MEMBERS,
        plan in plain_plan(),
    ) {
        let roster = roster_of(size);
        let receipt = draft(&roster, &plan);

        let splits = compute_split(&receipt).unwrap();

        for participant in roster.iter() {
            prop_assert_eq!(splits[participant], receipt.participant_total(participant).unwrap());
        }
    }

    #[test]
    fn split_is_idempotent(
        size in 1usize..=MAX_MEMBERS,
        plan in receipt_plan(),
    ) {
        let roster = roster_of(size);
        let receipt = draft(&roster, &plan);

        prop_assert_eq!(compute_split(&receipt).unwrap(), compute_split(&receipt).unwrap());
    }

    #[test]
    fn rounding_never_undercharges(
        size in 1usize..=MAX_MEMBERS,
        plan in receipt_plan(),
    ) {
        let roster = roster_of(size);
        let receipt = completed(&roster, &plan);

        let surplus = rounding_surplus(&receipt).cents();
        prop_assert!(surplus >= 0);
        prop_assert!(surplus <= receipt.active_participants().len() as i64);
    }

    #[test]
    fn consolidated_debts_are_one_directional(
        size in 2usize..=MAX_MEMBERS,
        plans in prop::collection::vec(receipt_plan(), 1..=8),
    ) {
        let roster = roster_of(size);
        let receipts: Vec<Receipt> = plans.iter().map(|plan| completed(&roster, plan)).collect();

        let debts = consolidate_debts(&receipts, &roster).unwrap();

        for debt in &debts {
            prop_assert_ne!(&debt.from, &debt.to);
            prop_assert!(debt.amount > Money::from_cents(1));
            let reversed = debts.iter().any(|d| d.from == debt.to && d.to == debt.from);
            prop_assert!(!reversed);
        }
    }

    #[test]
    fn balances_conserve_totals(
        size in 1usize..=MAX_MEMBERS,
        plans in prop::collection::vec(receipt_plan(), 1..=8),
    ) {
        let roster = roster_of(size);
        let receipts: Vec<Receipt> = plans.iter().map(|plan| completed(&roster, plan)).collect();

        let balances = compute_net_balances(&receipts, &roster).unwrap();
        let net: Money = balances.values().copied().sum();
        let surplus: Money = receipts.iter().map(rounding_surplus).sum();

        prop_assert_eq!(net, -surplus);
    }

    #[test]
    fn plain_balances_sum_to_zero(
        size in 1usize..=MAX_MEMBERS,
        plans in prop::collection::vec(plain_plan(), 1..=8),
    ) {
        let roster = roster_of(size);
        let receipts: Vec<Receipt> = plans.iter().map(|plan| completed(&roster, plan)).collect();

        let balances = compute_net_balances(&receipts, &roster).unwrap();
        let net: Money = balances.values().copied().sum();

        prop_assert_eq!(net, Money::zero());
    }

    #[test]
    fn debts_track_net_balances(
        size in 2usize..=MAX_MEMBERS,
        plans in prop::collection::vec(plain_plan(), 1..=8),
    ) {
        let roster = roster_of(size);
        let receipts: Vec<Receipt> = plans.iter().map(|plan| completed(&roster, plan)).collect();

        let balances = compute_net_balances(&receipts, &roster).unwrap();
        let debts = consolidate_debts(&receipts, &roster).unwrap();

        // Each dropped pair hides at most one cent.
        let tolerance = (size as i64) - 1;
        for participant in roster.iter() {
            let incoming: Money = debts.iter().filter(|d| &d.to == participant).map(|d| d.amount).sum();
            let outgoing: Money = debts.iter().filter(|d| &d.from == participant).map(|d| d.amount).sum();
            let drift = (balances[participant] - (incoming - outgoing)).cents().abs();
            prop_assert!(drift <= tolerance);
        }
    }
}
