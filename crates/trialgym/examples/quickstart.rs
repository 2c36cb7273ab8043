//! Drive the perceptual decision task with a noisy evidence-accumulating
//! agent and report its learning-criterion statistics. Trial boundaries
//! are logged at debug level.

use trialgym::prelude::*;

/// Sum stimulus evidence during the trial and answer once the decision
/// period starts.
struct Accumulator {
    evidence: f32,
}

impl Accumulator {
    fn act(&mut self, driver: &StepDriver) -> usize {
        let obs = driver.observation();
        if obs[0] > 0.5 {
            self.evidence += obs[2] - obs[1];
            return 0;
        }
        if self.evidence < 0.0 {
            1
        } else {
            2
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let task = PerceptualDecisionMaking::new(PerceptualConfig::default())?;
    let config = DriverConfig {
        hold: HoldConfig::with_probability(0.3),
        ..DriverConfig::seeded(42)
    };
    let mut driver = StepDriver::new(Box::new(task), config)?;
    println!(
        "task {}: {} channels, {} actions",
        driver.task_name(),
        driver.spaces().observation_width(),
        driver.spaces().actions
    );

    let mut agent = Accumulator { evidence: 0.0 };
    for _ in 0..2_000 {
        let action = agent.act(&driver);
        let result = driver.step(action)?;
        if result.info.new_trial {
            agent.evidence = 0.0;
        }
    }

    let stats = driver.stats();
    println!(
        "{} trials: decision rate {:.3}, accuracy {:.3}, total reward {:.1}",
        stats.trials,
        stats.decision_rate(),
        stats.accuracy(),
        stats.total_reward
    );
    println!(
        "meets 2AFC criterion: {}",
        stats.meets_criterion(0.99, 0.8)
    );
    Ok(())
}
