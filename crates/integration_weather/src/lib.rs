//! weatherapi.com integration
//!
//! Client for the weatherapi.com REST API (<https://www.weatherapi.com>).
//! Provides current conditions and multi-day forecasts as domain records,
//! with failures classified for retry and fail-fast decisions.

pub mod client;
mod models;

pub use client::{FetchError, MAX_FORECAST_DAYS, WeatherApiClient, WeatherApiConfig, WeatherClient};
