//! Cost insights service
//!
//! Answers the questions a cost dashboard asks: the daily cost of a group
//! or project over a repeating interval, and how a product's cost moved
//! between the two halves of a window. Each answer is assembled from one or
//! more data-source queries followed by a pure aggregation step.
//!
//! # Examples
//!
//! ```no_run
//! use costsight::config::InsightsConfig;
//! use costsight::insights::CostInsights;
//! use costsight_provider_json::DataLoader;
//!
//! # async fn example() -> costsight::Result<()> {
//! let insights = CostInsights::new(DataLoader::new()?, InsightsConfig::default())?;
//! let cost = insights
//!     .group_daily_cost("default-group", "R2/P30D/2021-09-01")
//!     .await?;
//! println!("{} days with cost", cost.aggregation.len());
//! # Ok(())
//! # }
//! ```

use crate::aggregation::Aggregator;
use crate::config::InsightsConfig;
use costsight_core::aggregation_types::{Cost, Entity, GroupedCosts};
use costsight_core::change::{change_of, trendline_of};
use costsight_core::error::{CostsightError, Result};
use costsight_core::intervals::RepeatingInterval;
use costsight_core::provider::{CostDataSource, CostQuery};
use costsight_core::types::{
    CostFilter, DIMENSION_LINKED_ACCOUNT, DIMENSION_SERVICE, DailyDate, GroupDefinition,
    RawPeriodRecord,
};
use tracing::{debug, info};

/// Format tag attached to every [`Cost`]
pub const COST_FORMAT: &str = "number";

/// Most recent day whose billing data is complete
///
/// Today's costs are still accruing, so this is always yesterday.
pub fn last_complete_billing_date(today: DailyDate) -> Result<DailyDate> {
    today
        .inner()
        .pred_opt()
        .map(DailyDate::new)
        .ok_or_else(|| CostsightError::InvalidDate(format!("no day before {today}")))
}

/// Cost insights over a single data source
pub struct CostInsights<S> {
    source: S,
    aggregator: Aggregator,
    config: InsightsConfig,
}

impl<S: CostDataSource> CostInsights<S> {
    /// Create the service, resolving the configured support plan
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccountType` if the support plan has no profile
    pub fn new(source: S, config: InsightsConfig) -> Result<Self> {
        let mut aggregator = Aggregator::new(config.aggregation.clone());
        if let Some(calculator) = config.surcharge_calculator()? {
            info!(
                "Including {} support surcharge",
                calculator.profile().account_type
            );
            aggregator = aggregator.with_surcharge(calculator);
        }

        Ok(Self {
            source,
            aggregator,
            config,
        })
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Daily cost of a group, broken down by product and by project
    pub async fn group_daily_cost(&self, group: &str, intervals: &str) -> Result<Cost> {
        let query = self.window_query(intervals)?;
        info!("Computing daily cost of group {} for {}", group, intervals);

        let (periods, by_service, by_account) = futures::try_join!(
            self.fetch(query.clone()),
            self.fetch(
                query
                    .clone()
                    .with_group_by(GroupDefinition::dimension(DIMENSION_SERVICE))
            ),
            self.fetch(query.with_group_by(GroupDefinition::dimension(DIMENSION_LINKED_ACCOUNT))),
        )?;

        let grouped_costs = GroupedCosts {
            product: self.aggregator.aggregate_grouped_series(&by_service)?,
            project: self.aggregator.aggregate_grouped_series(&by_account)?,
        };
        self.cost_of(group, &periods, grouped_costs)
    }

    /// Daily cost of a project, broken down by product
    pub async fn project_daily_cost(&self, project: &str, intervals: &str) -> Result<Cost> {
        let query = self.window_query(intervals)?;
        info!("Computing daily cost of project {} for {}", project, intervals);

        let (periods, by_service) = futures::try_join!(
            self.fetch(query.clone()),
            self.fetch(query.with_group_by(GroupDefinition::dimension(DIMENSION_SERVICE))),
        )?;

        let grouped_costs = GroupedCosts {
            product: self.aggregator.aggregate_grouped_series(&by_service)?,
            project: Vec::new(),
        };
        self.cost_of(project, &periods, grouped_costs)
    }

    /// Two-period comparison of one product, broken down by the product tag
    pub async fn product_insights(&self, product: &str, intervals: &str) -> Result<Entity> {
        let service = self.config.service_catalog.resolve(product)?;
        let query = self
            .window_query(intervals)?
            .with_filter(CostFilter::dimension(
                DIMENSION_SERVICE,
                vec![service.to_string()],
            ))
            .with_group_by(GroupDefinition::tag(self.config.product_tag.clone()));
        info!(
            "Computing insights for {} ({}) by tag {}",
            product, service, self.config.product_tag
        );

        let periods = self.fetch(query).await?;
        let split = self.aggregator.aggregate_entity_split(&periods)?;
        Ok(split.into_entity(product))
    }

    fn window_query(&self, intervals: &str) -> Result<CostQuery> {
        let interval = RepeatingInterval::parse(intervals)?;
        let start = interval.inclusive_start_date()?;
        debug!("Window {}..{} from {}", start, interval.end_date, interval);
        Ok(CostQuery::new(start, interval.end_date).with_metrics(self.config.query_metrics()))
    }

    async fn fetch(&self, query: CostQuery) -> Result<Vec<RawPeriodRecord>> {
        let periods = match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.fetch(&query))
                .await
                .map_err(|_| CostsightError::Timeout(limit))??,
            None => self.source.fetch(&query).await?,
        };
        debug!(
            "Fetched {} periods ({})",
            periods.len(),
            query
                .group_by
                .as_ref()
                .map_or_else(|| "ungrouped".to_string(), |g| g.to_string())
        );
        Ok(periods)
    }

    fn cost_of(
        &self,
        id: &str,
        periods: &[RawPeriodRecord],
        grouped_costs: GroupedCosts,
    ) -> Result<Cost> {
        let aggregation = self.aggregator.aggregate_date_series(periods)?;
        Ok(Cost {
            id: id.to_string(),
            format: COST_FORMAT.to_string(),
            change: change_of(&aggregation),
            trendline: trendline_of(&aggregation),
            aggregation,
            grouped_costs: Some(grouped_costs),
        })
    }
}
