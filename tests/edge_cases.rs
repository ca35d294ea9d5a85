use chrono::{DateTime, TimeZone, Utc};
use rulecraft::{
    Action, ActionResult, CompileError, Context, EngineConfig, EvalError, RuleDefinition,
    RuleEngine, RuleOutcome, SkipReason, Tier,
};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn off(amount: &str) -> ActionResult {
    ActionResult::Discount {
        amount: dec(amount),
    }
}

fn fixed(id: &str, condition: &str, amount: &str) -> RuleDefinition {
    RuleDefinition::new(
        id,
        condition,
        Action::FixedDiscount {
            amount: dec(amount),
        },
    )
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, d, 9, 30, 0).unwrap()
}

#[test]
fn vip_percentage_scenario() {
    let engine = RuleEngine::new();
    engine
        .add_rule(RuleDefinition::new(
            "vip-20",
            "user.is_vip = true AND order.total > 200",
            Action::Percentage { rate: dec("0.8") },
        ))
        .unwrap();

    let ctx = Context::new()
        .set("user.is_vip", true)
        .set("order.total", 300_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("60")]);
    assert_eq!(engine.find_best_discount(&ctx), dec("60"));

    let regular = Context::new()
        .set("user.is_vip", false)
        .set("order.total", 300_i64);
    assert!(engine.evaluate(&regular).is_empty());
    assert_eq!(engine.find_best_discount(&regular), Decimal::ZERO);
}

#[test]
fn first_order_scenario() {
    let engine = RuleEngine::new();
    engine
        .add_rule(RuleDefinition::new(
            "first-order",
            "user.is_new and order.is_first_order",
            Action::Percentage { rate: dec("0.8") },
        ))
        .unwrap();

    let ctx = Context::new()
        .set("user.is_new", true)
        .set("order.is_first_order", true)
        .set("order.total", 300_i64);
    // Charged 80% of 300: 240 paid, 60 off.
    assert_eq!(engine.evaluate(&ctx), vec![off("60")]);
}

#[test]
fn tiered_scenario() {
    let engine = RuleEngine::new();
    engine
        .add_rule(RuleDefinition::new(
            "spend-more",
            "true",
            Action::Tiered {
                tiers: vec![
                    Tier::new(dec("100"), dec("10")),
                    Tier::new(dec("200"), dec("30")),
                    Tier::new(dec("500"), dec("100")),
                ],
            },
        ))
        .unwrap();

    let ctx = Context::new().set("order.total", 250_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("30")]);
}

#[test]
fn trailing_operator_leaves_engine_unchanged() {
    let engine = RuleEngine::new();
    engine.add_rule(fixed("keep", "true", "5")).unwrap();
    let version = engine.version();

    let err = engine
        .add_rule(fixed("broken", "user.is_vip AND", "5"))
        .unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)), "got {err:?}");
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.version(), version);
    assert!(engine.get("broken").is_none());
}

#[test]
fn exclusivity_only_blocks_later_exclusive_rules() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("r1", "true", "10").priority(3).exclusive(true),
            fixed("r2", "true", "20").priority(2),
            fixed("r3", "true", "30").priority(1).exclusive(true),
        ])
        .unwrap();

    let ctx = Context::new().set("order.total", 100_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("10"), off("20")]);

    let report = engine.evaluate_detailed(&ctx);
    assert_eq!(report.matched(), vec!["r1", "r2"]);
    assert_eq!(
        report.outcome_of("r3"),
        Some(&RuleOutcome::Skipped(SkipReason::Excluded))
    );
}

#[test]
fn unmatched_exclusive_rule_does_not_exclude() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("r1", "order.total > 1000", "10")
                .priority(2)
                .exclusive(true),
            fixed("r2", "true", "20").priority(1).exclusive(true),
        ])
        .unwrap();

    let ctx = Context::new().set("order.total", 100_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("20")]);
}

#[test]
fn failing_exclusive_rule_does_not_exclude() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("r1", "user.tier = \"gold\"", "10")
                .priority(2)
                .exclusive(true),
            fixed("r2", "true", "20").priority(1).exclusive(true),
        ])
        .unwrap();

    let ctx = Context::new().set("order.total", 100_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("20")]);
}

#[test]
fn bad_rule_degrades_to_not_matched() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("unknown-var", "user.tier = \"gold\"", "10").priority(3),
            fixed("type-mismatch", "order.total > \"100\"", "10").priority(2),
            fixed("healthy", "order.total >= 50", "5").priority(1),
        ])
        .unwrap();

    let ctx = Context::new().set("order.total", 100_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("5")]);

    let report = engine.evaluate_detailed(&ctx);
    assert_eq!(report.errors().count(), 2);
    assert_eq!(
        report.outcome_of("unknown-var"),
        Some(&RuleOutcome::ConditionFailed(EvalError::UnknownVariable {
            path: "user.tier".into()
        }))
    );
}

#[test]
fn failing_action_is_recorded() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("needs-total", "true", "10").priority(1),
            RuleDefinition::new("gift", "true", Action::Gift {
                item: "mug".into(),
                quantity: 1,
            }),
        ])
        .unwrap();

    // No order.total: the discount cannot be computed, the gift still applies.
    let ctx = Context::new();
    let report = engine.evaluate_detailed(&ctx);
    assert!(matches!(
        report.outcome_of("needs-total"),
        Some(RuleOutcome::ActionFailed(_))
    ));
    assert_eq!(
        report.results(),
        &[ActionResult::Gift {
            item: "mug".into(),
            quantity: 1
        }]
    );
}

#[test]
fn disabled_rules_are_skipped() {
    let engine = RuleEngine::new();
    engine
        .add_rule(fixed("off", "true", "10").enabled(false))
        .unwrap();
    let ctx = Context::new().set("order.total", 100_i64);
    assert!(engine.evaluate(&ctx).is_empty());

    assert!(engine.set_enabled("off", true));
    assert_eq!(engine.evaluate(&ctx), vec![off("10")]);
}

#[test]
fn validity_window_inclusive() {
    let engine = RuleEngine::new();
    engine
        .add_rule(fixed("april", "true", "10").valid_between(Some(day(10)), Some(day(20))))
        .unwrap();
    let ctx = Context::new().set("order.total", 100_i64);

    assert!(engine.evaluate_at(&ctx, day(9)).is_empty());
    assert_eq!(engine.evaluate_at(&ctx, day(10)), vec![off("10")]);
    assert_eq!(engine.evaluate_at(&ctx, day(20)), vec![off("10")]);
    assert!(engine.evaluate_at(&ctx, day(21)).is_empty());

    let report = engine.evaluate_detailed_at(&ctx, day(21));
    assert_eq!(
        report.outcome_of("april"),
        Some(&RuleOutcome::Skipped(SkipReason::Expired))
    );
}

#[test]
fn equal_priority_results_keep_insertion_order() {
    let engine = RuleEngine::new();
    for (id, amount) in [("a", "1"), ("b", "2"), ("c", "3")] {
        engine.add_rule(fixed(id, "true", amount)).unwrap();
    }
    let ctx = Context::new().set("order.total", 100_i64);
    assert_eq!(engine.evaluate(&ctx), vec![off("1"), off("2"), off("3")]);
}

#[test]
fn best_discount_tie_keeps_first() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("first", "true", "15").priority(2),
            fixed("second", "true", "15").priority(1),
        ])
        .unwrap();
    let ctx = Context::new().set("order.total", 100_i64);
    assert_eq!(engine.find_best_discount(&ctx), dec("15"));
    assert_eq!(
        engine.snapshot().best_result_at(&ctx, Utc::now()),
        Some(off("15"))
    );
}

#[test]
fn batch_is_all_or_nothing() {
    let engine = RuleEngine::new();
    engine.add_rule(fixed("existing", "true", "1")).unwrap();

    let err = engine
        .add_rules([
            fixed("new-a", "true", "1"),
            fixed("new-b", "order.total >", "1"),
        ])
        .unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
    assert_eq!(engine.rule_ids(), ["existing"]);

    let err = engine
        .add_rules([fixed("new-a", "true", "1"), fixed("existing", "true", "1")])
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::DuplicateRule {
            id: "existing".into()
        }
    );
    assert_eq!(engine.len(), 1);
}

#[test]
fn replace_and_remove() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            fixed("a", "true", "1").priority(5),
            fixed("b", "true", "2").priority(1),
        ])
        .unwrap();

    engine
        .replace_rule(fixed("a", "true", "7").priority(0))
        .unwrap();
    assert_eq!(engine.rule_ids(), ["b", "a"]);

    assert_eq!(
        engine.replace_rule(fixed("zzz", "true", "1")),
        Err(CompileError::UnknownRule { id: "zzz".into() })
    );

    // A replacement that does not compile keeps the old rule.
    assert!(engine.replace_rule(fixed("b", "(", "9")).is_err());
    assert_eq!(engine.get("b").unwrap().source(), "true");

    assert!(engine.remove_rule("b"));
    assert!(!engine.remove_rule("b"));
    assert_eq!(engine.rule_ids(), ["a"]);
}

#[test]
fn depth_limit_from_config() {
    let engine = RuleEngine::with_config(EngineConfig::default().with_max_depth(3));
    assert!(engine
        .add_rule(fixed("shallow", "order.total > 1", "1"))
        .is_ok());
    assert!(matches!(
        engine.add_rule(fixed("deep", "not not not (order.total > 1)", "1")),
        Err(CompileError::Parse(_))
    ));
}

#[test]
fn composite_actions_through_engine() {
    let engine = RuleEngine::new();
    engine
        .add_rule(RuleDefinition::new(
            "bundle",
            "contains(user.tags, \"early\")",
            Action::All {
                actions: vec![
                    Action::Best {
                        actions: vec![
                            Action::FixedDiscount { amount: dec("15") },
                            Action::Percentage { rate: dec("0.9") },
                        ],
                    },
                    Action::Points { points: 200 },
                ],
            },
        ))
        .unwrap();

    let ctx = Context::new()
        .set("user.tags", vec!["early"])
        .set("order.total", 250_i64);
    let results = engine.evaluate(&ctx);
    assert_eq!(
        results,
        vec![ActionResult::Multiple {
            results: vec![off("25"), ActionResult::Points { points: 200 }],
        }]
    );
    assert_eq!(engine.find_best_discount(&ctx), dec("25"));
}

#[test]
fn extreme_amounts_do_not_abort_evaluation() {
    let engine = RuleEngine::new();
    engine
        .add_rules([
            RuleDefinition::new(
                "double-max",
                "true",
                Action::All {
                    actions: vec![
                        Action::FixedDiscount {
                            amount: Decimal::MAX,
                        },
                        Action::FixedDiscount {
                            amount: Decimal::MAX,
                        },
                    ],
                },
            )
            .priority(2),
            RuleDefinition::new("fixed-price", "true", Action::FixedPrice { price: dec("1") })
                .priority(1),
            RuleDefinition::new("points", "true", Action::Points { points: 10 }),
        ])
        .unwrap();

    let ctx = Context::new().set("order.total", Decimal::MAX);
    assert_eq!(engine.find_best_discount(&ctx), Decimal::MAX);
    assert_eq!(engine.evaluate_detailed(&ctx).total_discount(), Decimal::MAX);

    let ctx = Context::new().set("order.total", Decimal::MIN);
    let results = engine.evaluate(&ctx);
    assert_eq!(results.len(), 3);
    assert_eq!(results[1], off("0"));
    assert_eq!(results[2], ActionResult::Points { points: 10 });
    assert_eq!(engine.find_best_discount(&ctx), Decimal::ZERO);
}

#[test]
fn empty_engine() {
    let engine = RuleEngine::new();
    let ctx = Context::new();
    assert!(engine.is_empty());
    assert!(engine.evaluate(&ctx).is_empty());
    assert_eq!(engine.find_best_discount(&ctx), Decimal::ZERO);
    assert_eq!(engine.evaluate_detailed(&ctx).version(), 0);
}
