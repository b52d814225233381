//! Per-level weather rotation
//!
//! Level 1 alternates between two states. Levels 2 and 3 draw uniformly from
//! the states other than the current one, so every rotation is a real change.
//! Level 3 pins the sunny spell length so the bird strike has room to play out.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::audio::AmbientTrack;
use crate::consts::{WEATHER_MAX_DURATION, WEATHER_MIN_DURATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Sunny,
    Rainy,
    SourRain,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Sunny => "sunny",
            Weather::Rainy => "rainy",
            Weather::SourRain => "sourrain",
        }
    }

    /// Looping ambience while this weather is on screen
    pub fn ambient(&self) -> Option<AmbientTrack> {
        match self {
            Weather::Sunny => None,
            Weather::Rainy => Some(AmbientTrack::Rain),
            Weather::SourRain => Some(AmbientTrack::SourRain),
        }
    }
}

/// How the next weather is chosen when a spell ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherSelection {
    /// Flip between the first two states of the set
    Alternate,
    /// Uniform over the set minus the current state
    RandomOther,
}

/// Static description of a level's weather
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherPlan {
    pub states: &'static [Weather],
    pub selection: WeatherSelection,
    /// Fixed sunny spell length; `None` draws it like any other spell
    pub sunny_duration: Option<f32>,
}

impl WeatherPlan {
    fn duration_for(&self, weather: Weather, rng: &mut impl Rng) -> f32 {
        match (weather, self.sunny_duration) {
            (Weather::Sunny, Some(fixed)) => fixed,
            _ => rng.random_range(WEATHER_MIN_DURATION..=WEATHER_MAX_DURATION),
        }
    }

    fn next_after(&self, current: Weather, rng: &mut impl Rng) -> Weather {
        match self.selection {
            WeatherSelection::Alternate => {
                if current == self.states[0] {
                    self.states[1]
                } else {
                    self.states[0]
                }
            }
            WeatherSelection::RandomOther => {
                let options: Vec<Weather> =
                    self.states.iter().copied().filter(|w| *w != current).collect();
                options.choose(rng).copied().unwrap_or(current)
            }
        }
    }
}

/// Live weather timer for one round
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherCycle {
    plan: WeatherPlan,
    weather: Weather,
    /// Seconds into the current spell
    timer: f32,
    /// Length of the current spell
    duration: f32,
}

impl WeatherCycle {
    /// Every round opens sunny
    pub fn new(plan: WeatherPlan, rng: &mut impl Rng) -> Self {
        let duration = plan.duration_for(Weather::Sunny, rng);
        Self {
            plan,
            weather: Weather::Sunny,
            timer: 0.0,
            duration,
        }
    }

    #[inline]
    pub fn weather(&self) -> Weather {
        self.weather
    }

    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Advance the spell; returns the new weather when it rotates
    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) -> Option<Weather> {
        self.timer += dt;
        if self.timer < self.duration {
            return None;
        }
        self.timer = 0.0;
        self.weather = self.plan.next_after(self.weather, rng);
        self.duration = self.plan.duration_for(self.weather, rng);
        log::debug!(
            "Weather -> {} for {:.2}s",
            self.weather.as_str(),
            self.duration
        );
        Some(self.weather)
    }

    /// Pin the weather for `duration` seconds (tests and debug tooling)
    pub fn force(&mut self, weather: Weather, duration: f32) {
        self.weather = weather;
        self.timer = 0.0;
        self.duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const TRIO: WeatherPlan = WeatherPlan {
        states: &[Weather::Sunny, Weather::Rainy, Weather::SourRain],
        selection: WeatherSelection::RandomOther,
        sunny_duration: None,
    };

    #[test]
    fn test_random_rotation_never_repeats() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut cycle = WeatherCycle::new(TRIO, &mut rng);
        let mut last = cycle.weather();
        let mut transitions = 0;
        while transitions < 10_000 {
            if let Some(next) = cycle.tick(1.0, &mut rng) {
                assert_ne!(next, last);
                last = next;
                transitions += 1;
            }
        }
    }

    #[test]
    fn test_alternate_flips_deterministically() {
        let plan = WeatherPlan {
            states: &[Weather::Sunny, Weather::Rainy],
            selection: WeatherSelection::Alternate,
            sunny_duration: None,
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let mut cycle = WeatherCycle::new(plan, &mut rng);
        let mut seen = Vec::new();
        while seen.len() < 4 {
            if let Some(w) = cycle.tick(0.5, &mut rng) {
                seen.push(w);
            }
        }
        assert_eq!(
            seen,
            vec![Weather::Rainy, Weather::Sunny, Weather::Rainy, Weather::Sunny]
        );
    }

    #[test]
    fn test_durations_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut cycle = WeatherCycle::new(TRIO, &mut rng);
        for _ in 0..2_000 {
            cycle.tick(0.25, &mut rng);
            assert!((WEATHER_MIN_DURATION..=WEATHER_MAX_DURATION).contains(&cycle.duration()));
        }
    }

    #[test]
    fn test_pinned_sunny_duration() {
        let plan = WeatherPlan {
            sunny_duration: Some(5.0),
            ..TRIO
        };
        let mut rng = Pcg32::seed_from_u64(11);
        let mut cycle = WeatherCycle::new(plan, &mut rng);
        assert_eq!(cycle.duration(), 5.0);
        for _ in 0..5_000 {
            if cycle.tick(0.1, &mut rng) == Some(Weather::Sunny) {
                assert_eq!(cycle.duration(), 5.0);
            }
        }
    }

    #[test]
    fn test_forced_weather_holds() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut cycle = WeatherCycle::new(TRIO, &mut rng);
        cycle.force(Weather::SourRain, f32::MAX);
        for _ in 0..1_000 {
            assert_eq!(cycle.tick(0.016, &mut rng), None);
        }
        assert_eq!(cycle.weather(), Weather::SourRain);
    }
}
