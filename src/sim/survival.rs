//! Weather-survival round shared by all three levels
//!
//! One engine, three `const` configurations. Level 3 layers the bird strike on
//! top. Per frame, while live: time runs down, the weather rotates, the bird
//! advances, counters accrue, then the outcome is checked in fixed order:
//! bird hit, win, damage tolerance, timeout.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bird::{BirdEvent, BirdStrike};
use super::countdown::Countdown;
use super::weather::{Weather, WeatherCycle, WeatherPlan, WeatherSelection};
use crate::consts::*;
use crate::ms_to_secs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelId {
    One,
    Two,
    Three,
}

impl LevelId {
    pub const ALL: [LevelId; 3] = [LevelId::One, LevelId::Two, LevelId::Three];

    pub fn number(self) -> u8 {
        match self {
            LevelId::One => 1,
            LevelId::Two => 2,
            LevelId::Three => 3,
        }
    }

    pub fn config(self) -> &'static LevelConfig {
        match self {
            LevelId::One => &LEVEL_ONE,
            LevelId::Two => &LEVEL_TWO,
            LevelId::Three => &LEVEL_THREE,
        }
    }

    pub fn next(self) -> Option<LevelId> {
        match self {
            LevelId::One => Some(LevelId::Two),
            LevelId::Two => Some(LevelId::Three),
            LevelId::Three => None,
        }
    }
}

/// Beneficial counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Sunlight,
    Rain,
}

impl Resource {
    /// Weather during which open arms fill this counter
    pub fn weather(self) -> Weather {
        match self {
            Resource::Sunlight => Weather::Sunny,
            Resource::Rain => Weather::Rainy,
        }
    }
}

/// Per-level tuning; levels are fixed, so every instance is `const`
#[derive(Debug, Clone, Copy)]
pub struct LevelConfig {
    pub duration: f32,
    /// Counters that must all be full to win
    pub required: &'static [(Resource, f32)],
    pub tolerance: f32,
    pub weather: WeatherPlan,
    /// Does this weather hurt given the arm state?
    pub damage_policy: fn(Weather, bool) -> bool,
    pub bird_strikes: bool,
}

impl LevelConfig {
    pub fn required(&self, resource: Resource) -> Option<f32> {
        self.required
            .iter()
            .find(|(r, _)| *r == resource)
            .map(|(_, amount)| *amount)
    }
}

/// Level 1 punishes open arms in the rain
fn open_in_rain(weather: Weather, arms_open: bool) -> bool {
    weather == Weather::Rainy && arms_open
}

/// Levels 2 and 3 collect rain and punish open arms in sour rain
fn open_in_sour_rain(weather: Weather, arms_open: bool) -> bool {
    weather == Weather::SourRain && arms_open
}

pub const LEVEL_ONE: LevelConfig = LevelConfig {
    duration: LEVEL1_DURATION,
    required: &[(Resource::Sunlight, LEVEL1_SUNLIGHT_REQUIRED)],
    tolerance: LEVEL1_RAIN_TOLERANCE,
    weather: WeatherPlan {
        states: &[Weather::Sunny, Weather::Rainy],
        selection: WeatherSelection::Alternate,
        sunny_duration: None,
    },
    damage_policy: open_in_rain,
    bird_strikes: false,
};

pub const LEVEL_TWO: LevelConfig = LevelConfig {
    duration: LEVEL2_DURATION,
    required: &[
        (Resource::Sunlight, LEVEL2_SUNLIGHT_REQUIRED),
        (Resource::Rain, LEVEL2_RAIN_REQUIRED),
    ],
    tolerance: LEVEL2_SOURRAIN_TOLERANCE,
    weather: WeatherPlan {
        states: &[Weather::Sunny, Weather::Rainy, Weather::SourRain],
        selection: WeatherSelection::RandomOther,
        sunny_duration: None,
    },
    damage_policy: open_in_sour_rain,
    bird_strikes: false,
};

pub const LEVEL_THREE: LevelConfig = LevelConfig {
    duration: LEVEL3_DURATION,
    required: &[
        (Resource::Sunlight, LEVEL3_SUNLIGHT_REQUIRED),
        (Resource::Rain, LEVEL3_RAIN_REQUIRED),
    ],
    tolerance: LEVEL3_SOURRAIN_TOLERANCE,
    weather: WeatherPlan {
        states: &[Weather::Sunny, Weather::Rainy, Weather::SourRain],
        selection: WeatherSelection::RandomOther,
        sunny_duration: Some(LEVEL3_SUNNY_DURATION),
    },
    damage_policy: open_in_sour_rain,
    bird_strikes: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossCause {
    Damage,
    Timeout,
    BirdStrike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost(LossCause),
}

impl Outcome {
    pub fn is_win(self) -> bool {
        self == Outcome::Won
    }
}

/// What one frame of a round produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundTick {
    /// Countdown finished this frame
    pub went_live: bool,
    pub weather_changed: Option<Weather>,
    pub bird: Vec<BirdEvent>,
    pub outcome: Option<Outcome>,
}

/// Live state of one round attempt
#[derive(Debug, Clone)]
pub struct SurvivalRound {
    level: LevelId,
    sunlight: f32,
    rain: f32,
    damage: f32,
    time_left: f32,
    weather: WeatherCycle,
    active: bool,
    countdown: Countdown,
    bird: Option<BirdStrike>,
}

impl SurvivalRound {
    /// Fresh round, frozen behind a running countdown
    pub fn new(level: LevelId, rng: &mut impl Rng) -> Self {
        let config = level.config();
        let weather = WeatherCycle::new(config.weather, rng);
        let bird = config.bird_strikes.then(|| BirdStrike::armed(rng));
        Self {
            level,
            sunlight: 0.0,
            rain: 0.0,
            damage: 0.0,
            time_left: config.duration,
            weather,
            active: false,
            countdown: Countdown::started(),
            bird,
        }
    }

    #[inline]
    pub fn level(&self) -> LevelId {
        self.level
    }

    #[inline]
    pub fn config(&self) -> &'static LevelConfig {
        self.level.config()
    }

    pub fn collected(&self, resource: Resource) -> f32 {
        match resource {
            Resource::Sunlight => self.sunlight,
            Resource::Rain => self.rain,
        }
    }

    #[inline]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    #[inline]
    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    #[inline]
    pub fn weather(&self) -> Weather {
        self.weather.weather()
    }

    #[inline]
    pub fn weather_cycle(&self) -> &WeatherCycle {
        &self.weather
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[inline]
    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_running()
    }

    #[inline]
    pub fn bird(&self) -> Option<&BirdStrike> {
        self.bird.as_ref()
    }

    /// Every required counter is full
    pub fn is_complete(&self) -> bool {
        self.config()
            .required
            .iter()
            .all(|(resource, amount)| self.collected(*resource) >= *amount)
    }

    /// Pin the weather (tests and debug tooling)
    pub fn force_weather(&mut self, weather: Weather, duration: f32) {
        self.weather.force(weather, duration);
    }

    /// Skip the bird straight into its fall (tests and debug tooling)
    pub fn force_bird_drop(&mut self) {
        if let Some(bird) = self.bird.as_mut() {
            bird.drop_now();
        }
    }

    /// Advance one frame
    pub fn update(&mut self, dt_ms: u32, arms_open: bool, rng: &mut impl Rng) -> RoundTick {
        let mut report = RoundTick::default();

        if self.countdown.is_running() {
            if self.countdown.advance(dt_ms) {
                self.active = true;
                report.went_live = true;
            }
            return report;
        }
        if !self.active {
            return report;
        }

        let config = self.config();
        let dt = ms_to_secs(dt_ms);

        self.time_left = (self.time_left - dt).max(0.0);

        report.weather_changed = self.weather.tick(dt, rng);
        if report.weather_changed == Some(Weather::Sunny)
            && let Some(bird) = self.bird.as_mut()
        {
            bird.rearm(rng);
        }

        let weather = self.weather.weather();
        if let Some(bird) = self.bird.as_mut() {
            report.bird = bird.update(
                weather == Weather::Sunny,
                self.weather.timer(),
                dt,
                arms_open,
                rng,
            );
            for event in &report.bird {
                log::debug!("Bird strike: {:?}", event);
            }
            if report.bird.contains(&BirdEvent::Struck) {
                return self.finish(report, Outcome::Lost(LossCause::BirdStrike));
            }
        }

        if arms_open {
            for &(resource, amount) in config.required {
                if resource.weather() == weather {
                    let counter = match resource {
                        Resource::Sunlight => &mut self.sunlight,
                        Resource::Rain => &mut self.rain,
                    };
                    *counter = (*counter + dt).min(amount);
                }
            }
        }
        if (config.damage_policy)(weather, arms_open) {
            self.damage = (self.damage + dt).min(config.tolerance);
        }

        if self.is_complete() {
            self.finish(report, Outcome::Won)
        } else if self.damage >= config.tolerance {
            self.finish(report, Outcome::Lost(LossCause::Damage))
        } else if self.time_left <= 0.0 {
            self.finish(report, Outcome::Lost(LossCause::Timeout))
        } else {
            report
        }
    }

    fn finish(&mut self, mut report: RoundTick, outcome: Outcome) -> RoundTick {
        self.active = false;
        report.outcome = Some(outcome);
        log::info!("Level {} finished: {:?}", self.level.number(), outcome);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bird::{check_height, strike_height};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: u32 = 16;

    fn live_round(level: LevelId, rng: &mut Pcg32) -> SurvivalRound {
        let mut round = SurvivalRound::new(level, rng);
        while !round.update(DT, false, rng).went_live {}
        round
    }

    #[test]
    fn test_countdown_freezes_everything() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut round = SurvivalRound::new(LevelId::One, &mut rng);
        for _ in 0..187 {
            let tick = round.update(DT, true, &mut rng);
            assert!(!tick.went_live);
        }
        // 187 * 16 = 2992 ms
        assert!(round.is_counting_down());
        assert_eq!(round.time_left(), LEVEL1_DURATION);
        assert_eq!(round.collected(Resource::Sunlight), 0.0);
        assert!(!round.update(8, true, &mut rng).went_live);
        let tick = round.update(1, true, &mut rng);
        assert!(tick.went_live);
        assert!(round.is_active());
        assert!(!round.is_counting_down());
    }

    #[test]
    fn test_level_one_sunshine_wins_exactly_at_ten() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut round = live_round(LevelId::One, &mut rng);
        round.force_weather(Weather::Sunny, f32::MAX);
        let outcome = loop {
            let before = round.collected(Resource::Sunlight);
            let tick = round.update(DT, true, &mut rng);
            if let Some(outcome) = tick.outcome {
                assert!(before < LEVEL1_SUNLIGHT_REQUIRED);
                break outcome;
            }
        };
        assert_eq!(outcome, Outcome::Won);
        assert_eq!(round.collected(Resource::Sunlight), LEVEL1_SUNLIGHT_REQUIRED);
        assert!(!round.is_active());
    }

    #[test]
    fn test_level_one_rain_hurts_open_arms() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut round = live_round(LevelId::One, &mut rng);
        round.force_weather(Weather::Rainy, f32::MAX);
        round.update(DT, false, &mut rng);
        assert_eq!(round.damage(), 0.0);
        round.update(DT, true, &mut rng);
        assert!(round.damage() > 0.0);
    }

    #[test]
    fn test_level_two_rain_is_collected() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut round = live_round(LevelId::Two, &mut rng);
        round.force_weather(Weather::Rainy, f32::MAX);
        round.update(DT, true, &mut rng);
        assert!(round.collected(Resource::Rain) > 0.0);
        assert_eq!(round.damage(), 0.0);
    }

    #[test]
    fn test_damage_beats_timeout_on_a_tie() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut round = live_round(LevelId::Two, &mut rng);
        round.force_weather(Weather::SourRain, f32::MAX);
        round.damage = LEVEL2_SOURRAIN_TOLERANCE - 0.01;
        round.time_left = 0.01;
        let tick = round.update(DT, true, &mut rng);
        assert_eq!(round.damage(), LEVEL2_SOURRAIN_TOLERANCE);
        assert_eq!(round.time_left(), 0.0);
        assert_eq!(tick.outcome, Some(Outcome::Lost(LossCause::Damage)));
    }

    #[test]
    fn test_timeout_when_nothing_else() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut round = live_round(LevelId::One, &mut rng);
        let mut outcome = None;
        for _ in 0..5_000 {
            outcome = round.update(DT, false, &mut rng).outcome;
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(Outcome::Lost(LossCause::Timeout)));
    }

    #[test]
    fn test_bird_hit_fails_exactly_at_midpoint() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut round = live_round(LevelId::Three, &mut rng);
        round.force_weather(Weather::Sunny, f32::MAX);
        round.force_bird_drop();
        loop {
            let y_before = round.bird().and_then(|b| b.position()).map(|p| p.y);
            let tick = round.update(DT, true, &mut rng);
            match tick.outcome {
                Some(outcome) => {
                    assert_eq!(outcome, Outcome::Lost(LossCause::BirdStrike));
                    let y = y_before.unwrap_or_default() + BIRD_DROP_SPEED;
                    assert!(y >= strike_height());
                    assert!(y - BIRD_DROP_SPEED < strike_height());
                    break;
                }
                None => {
                    let y = round.bird().and_then(|b| b.position()).map(|p| p.y);
                    assert!(y.is_some_and(|y| y < strike_height()));
                }
            }
        }
    }

    #[test]
    fn test_bird_blocked_at_check_never_fails() {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut round = live_round(LevelId::Three, &mut rng);
        round.force_weather(Weather::Sunny, f32::MAX);
        round.force_bird_drop();
        // Open until the frame that crosses the check height, closed on it
        loop {
            let y = round.bird().and_then(|b| b.position()).map(|p| p.y).unwrap_or_default();
            let closing = y + BIRD_DROP_SPEED >= check_height();
            let tick = round.update(DT, !closing, &mut rng);
            if closing {
                assert!(tick.bird.contains(&BirdEvent::Blocked));
                break;
            }
        }
        assert!(round.bird().is_some_and(|b| b.is_finished()));
        assert!(round.bird().and_then(|b| b.position()).is_none());
        for _ in 0..120 {
            let tick = round.update(DT, true, &mut rng);
            assert_ne!(tick.outcome, Some(Outcome::Lost(LossCause::BirdStrike)));
        }
    }

    #[test]
    fn test_only_level_three_has_a_bird() {
        let mut rng = Pcg32::seed_from_u64(9);
        for level in LevelId::ALL {
            let round = SurvivalRound::new(level, &mut rng);
            assert_eq!(round.bird().is_some(), level == LevelId::Three);
        }
    }

    proptest! {
        #[test]
        fn test_counters_stay_within_limits(seed in any::<u64>(), arms in prop::collection::vec(any::<bool>(), 1..600), level in 0usize..3) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let level = LevelId::ALL[level];
            let config = level.config();
            let mut round = live_round(level, &mut rng);
            for open in arms {
                let tick = round.update(DT, open, &mut rng);
                for &(resource, amount) in config.required {
                    let v = round.collected(resource);
                    prop_assert!((0.0..=amount).contains(&v));
                }
                prop_assert!((0.0..=config.tolerance).contains(&round.damage()));
                prop_assert!(round.weather_cycle().timer() >= 0.0);
                if tick.outcome.is_some() {
                    break;
                }
            }
        }
    }
}
