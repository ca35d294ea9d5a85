use chrono::{TimeZone, Utc};
use rulecraft::{Context, RuleDefinition, RuleEngine};
use tracing_subscriber::EnvFilter;

const RULES: &str = r#"[
    {
        "id": "spring-sale",
        "name": "Spring sale",
        "priority": 20,
        "exclusive": true,
        "condition": "order.total >= 50",
        "valid_from": "2024-03-20T00:00:00Z",
        "valid_to": "2024-04-30T23:59:59Z",
        "action": { "type": "percentage", "rate": "0.85" }
    },
    {
        "id": "staff",
        "priority": 15,
        "exclusive": true,
        "condition": "contains(user.tags, \"staff\")",
        "action": { "type": "fixed_discount", "amount": "25" }
    },
    {
        "id": "gold-bundle",
        "priority": 10,
        "condition": "user.tier = \"gold\" and not user.is_new",
        "action": {
            "type": "all",
            "actions": [
                { "type": "points", "points": 500 },
                {
                    "type": "best",
                    "actions": [
                        { "type": "fixed_price", "price": "99" },
                        { "type": "threshold", "threshold": "150", "discount": "40" }
                    ]
                }
            ]
        }
    },
    {
        "id": "legacy-coupon",
        "condition": "coupon.code = \"OLD10\"",
        "action": { "type": "fixed_discount", "amount": "10" }
    }
]"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let defs: Vec<RuleDefinition> = serde_json::from_str(RULES).expect("invalid rule file");
    let engine = RuleEngine::new();
    engine.add_rules(defs).expect("failed to compile rules");
    println!("{engine}");

    let ctx = Context::new()
        .set("user.tier", "gold")
        .set("user.is_new", false)
        .set("user.tags", vec!["staff", "early"])
        .set("order.total", 180_i64);

    // Priced during the spring sale: the sale excludes the staff discount.
    let during = Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap();
    let report = engine.evaluate_detailed_at(&ctx, during);
    println!("{report}");
    for entry in report.trace() {
        println!("  {:<14} {:?}", entry.rule_id, entry.outcome);
    }
    println!("Best discount: {}", engine.find_best_discount_at(&ctx, during));

    // Later in the year the sale has expired and the staff discount applies.
    let after = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    let report = engine.evaluate_detailed_at(&ctx, after);
    println!("{report}");
    println!("Best discount: {}", engine.find_best_discount_at(&ctx, after));

    engine.set_enabled("staff", false);
    println!("After disabling staff: {}", engine.find_best_discount_at(&ctx, after));
}
