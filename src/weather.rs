//! Weather card data source

use async_trait::async_trait;
use farmlog_data::domain::DomainResult;
use farmlog_data::repository::Latency;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    /// Degrees Fahrenheit
    pub temp: i32,
    pub condition: String,
    pub icon: String,
    /// Percent
    pub humidity: u8,
    /// mph
    pub wind_speed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub day: String,
    pub temp: i32,
    pub condition: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub location: String,
    pub current: Conditions,
    pub forecast: Vec<Forecast>,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self) -> DomainResult<Weather>;

    async fn forecast(&self) -> DomainResult<Vec<Forecast>>;
}

/// Static sample data for Fresno, CA
#[derive(Debug, Clone, Default)]
pub struct MockWeather {
    latency: Option<Latency>,
}

impl MockWeather {
    pub fn with_latency(latency: Latency) -> Self {
        Self { latency: Some(latency) }
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency.sample()).await;
        }
    }

    fn sample() -> Weather {
        let day = |day: &str, temp: i32, condition: &str, icon: &str| Forecast {
            day: day.to_string(),
            temp,
            condition: condition.to_string(),
            icon: icon.to_string(),
        };
        Weather {
            location: "Fresno, CA".to_string(),
            current: Conditions {
                temp: 72,
                condition: "Sunny".to_string(),
                icon: "Sun".to_string(),
                humidity: 45,
                wind_speed: 8,
            },
            forecast: vec![
                day("Today", 72, "Sunny", "Sun"),
                day("Tomorrow", 75, "Partly Cloudy", "PartlyCloudyDay"),
                day("Wed", 68, "Cloudy", "Cloud"),
                day("Thu", 71, "Light Rain", "CloudRain"),
                day("Fri", 74, "Sunny", "Sun"),
            ],
        }
    }
}

#[async_trait]
impl WeatherSource for MockWeather {
    async fn current(&self) -> DomainResult<Weather> {
        self.delay().await;
        Ok(Self::sample())
    }

    async fn forecast(&self) -> DomainResult<Vec<Forecast>> {
        self.delay().await;
        Ok(Self::sample().forecast)
    }
}
