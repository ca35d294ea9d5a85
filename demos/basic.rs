use rulecraft::{Action, Context, RuleDefinition, RuleEngine, Tier};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let engine = RuleEngine::new();
    engine
        .add_rules([
            RuleDefinition::new(
                "vip-20",
                "user.is_vip = true AND order.total > 200",
                Action::Percentage {
                    rate: Decimal::new(8, 1),
                },
            )
            .name("VIP 20% off")
            .priority(10)
            .exclusive(true),
            RuleDefinition::new(
                "spend-more",
                "order.total >= 100",
                Action::Tiered {
                    tiers: vec![
                        Tier::new(Decimal::from(100), Decimal::from(10)),
                        Tier::new(Decimal::from(200), Decimal::from(30)),
                        Tier::new(Decimal::from(500), Decimal::from(100)),
                    ],
                },
            )
            .priority(5),
            RuleDefinition::new(
                "welcome-gift",
                "user.is_new",
                Action::Gift {
                    item: "tote-bag".into(),
                    quantity: 1,
                },
            ),
        ])
        .expect("failed to compile rules");

    println!("{engine}");

    // A malformed condition is rejected and leaves the engine unchanged.
    let broken = RuleDefinition::new("broken", "user.is_vip AND", Action::Points { points: 1 });
    if let Err(err) = engine.add_rule(broken) {
        println!("Rejected: {err}");
    }

    let ctx = Context::new()
        .set("user.is_vip", true)
        .set("user.is_new", false)
        .set("order.total", 300_i64);

    for result in engine.evaluate(&ctx) {
        println!("Matched: {result:?}");
    }
    println!("Best discount: {}", engine.find_best_discount(&ctx));
}
