use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fragility_core::{Panel, PanelRecord};

/// (industry, EM drift per year) for the synthetic market.
const INDUSTRIES: [(&str, f64); 4] = [
    ("AI", 0.12),
    ("EV", 0.08),
    ("Energy", 0.0),
    ("Pharma", 0.02),
];

pub fn row(firm: &str, industry: &str, year: i32, em: f64, peg: f64, ret: f64) -> PanelRecord {
    PanelRecord {
        firm: firm.to_string(),
        industry: industry.to_string(),
        year,
        hybrid_em: em,
        peg,
        f_score: 5,
        debt_equity: 1.0,
        cfo_growth: 0.05,
        realized_return: ret,
    }
}

/// Four industries x five firms x 2014..=2024; AI and EV heat up over time
/// and firms with extreme Hybrid_EM crash.
pub fn market_panel(seed: u64) -> Panel {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for (industry, drift) in INDUSTRIES {
        for f in 0..5 {
            let base_em: f64 = rng.gen_range(0.8..1.6);
            for year in 2014..=2024 {
                let em = base_em + drift * (year - 2014) as f64 + rng.gen_range(-0.3..0.3);
                let crash = em > 2.0 && rng.gen_bool(0.7);
                rows.push(PanelRecord {
                    firm: format!("{}-{}", industry, f),
                    industry: industry.to_string(),
                    year,
                    hybrid_em: em,
                    peg: rng.gen_range(1.0..2.5) + drift * 5.0,
                    f_score: rng.gen_range(2..=8),
                    debt_equity: rng.gen_range(0.3..2.0),
                    cfo_growth: rng.gen_range(-0.15..0.2),
                    realized_return: if crash {
                        rng.gen_range(-0.7..-0.35)
                    } else {
                        rng.gen_range(-0.2..0.35)
                    },
                });
            }
        }
    }
    Panel::new(rows)
}
