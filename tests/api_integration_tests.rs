use anyhow::Result;
use food_search::api_connection::ApiConnectionError;
use food_search::config::{NutritionixConfig, OpenFoodFactsConfig, SearchConfig, UsdaConfig};
use food_search::models::FoodSource;
use food_search::providers::{
    NutritionProvider, NutritionixProvider, OpenFoodFactsProvider, ProviderOutcome, ProviderQuery, UsdaProvider,
};
use food_search::search::MemoryFoodStore;
use food_search::FoodSearch;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RAW_QUERY: &str = "2 cups of brown rice";

fn query() -> ProviderQuery<'static> {
    ProviderQuery {
        raw: RAW_QUERY,
        page: 1,
        page_size: 20,
    }
}

fn usda_config(base_url: &str, api_key: Option<&str>) -> UsdaConfig {
    UsdaConfig {
        api_key: api_key.map(str::to_string),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(2),
    }
}

fn nutritionix_config(base_url: &str) -> NutritionixConfig {
    NutritionixConfig {
        app_id: Some("test-app".to_string()),
        api_key: Some("test-key".to_string()),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(3),
    }
}

fn off_config(base_url: &str, timeout: Duration) -> OpenFoodFactsConfig {
    OpenFoodFactsConfig {
        enabled: true,
        user_agent: "food_search-tests/1.0".to_string(),
        base_url: base_url.to_string(),
        timeout,
    }
}

fn usda_body() -> serde_json::Value {
    json!({
        "totalHits": 1,
        "foods": [{
            "fdcId": 169704,
            "description": "RICE, BROWN, LONG-GRAIN, COOKED",
            "dataType": "SR Legacy",
            "foodNutrients": [
                { "nutrientId": 1008, "value": 123.0 },
                { "nutrientId": 1003, "value": 2.74 },
                { "nutrientId": 1005, "value": 25.6 },
                { "nutrientId": 1004, "value": 0.97 },
                { "nutrientId": 1079, "value": 1.6 }
            ]
        }]
    })
}

fn nutritionix_body() -> serde_json::Value {
    json!({
        "foods": [{
            "food_name": "brown rice",
            "nf_calories": 433.2,
            "nf_protein": 10.06,
            "nf_total_carbohydrate": 89.54,
            "nf_total_fat": 3.43,
            "nf_dietary_fiber": 7.02,
            "serving_qty": 2,
            "serving_unit": "cup",
            "serving_weight_grams": 390
        }]
    })
}

fn off_body() -> serde_json::Value {
    json!({
        "count": 2,
        "products": [
            {
                "code": "0070662030011",
                "product_name": "Brown Rice",
                "brands": "Uncle Ben's,Mars",
                "serving_size": "45 g",
                "serving_quantity": "45",
                "nutriments": { "energy-kcal_serving": 160, "energy-kcal_100g": 356, "proteins_100g": 8.9 }
            },
            { "code": "000", "product_name": "", "nutriments": {} }
        ]
    })
}

#[tokio::test]
async fn test_usda_search_success() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("query", RAW_QUERY))
        .and(query_param("dataType", "Foundation,SR Legacy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usda_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = UsdaProvider::new(&usda_config(&mock_server.uri(), Some("test-key")));
    let candidates = match provider.search(&query()).await {
        ProviderOutcome::Found(c) => c,
        other => panic!("expected results, got {other:?}"),
    };

    assert_eq!(candidates.len(), 1);
    let rice = &candidates[0];
    assert_eq!(rice.name, "Rice, Brown, Long-Grain, Cooked");
    assert_eq!(rice.source, FoodSource::GovernmentDb);
    assert_eq!(rice.source, provider.source());
    assert_eq!(rice.source_id, "169704");
    assert_eq!(rice.calories, 123.0);
    assert_eq!(rice.protein_g, 2.7);
    assert_eq!(rice.fiber_g, Some(1.6));
    Ok(())
}

#[tokio::test]
async fn test_usda_without_key_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usda_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = UsdaProvider::new(&usda_config(&mock_server.uri(), None));
    let outcome = provider.search(&query()).await;
    assert!(matches!(outcome, ProviderOutcome::Skipped("USDA_API_KEY")));
}

#[tokio::test]
async fn test_nutritionix_sends_raw_query_with_credentials() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/natural/nutrients"))
        .and(header("x-app-id", "test-app"))
        .and(header("x-app-key", "test-key"))
        .and(body_json(json!({ "query": RAW_QUERY })))
        .respond_with(ResponseTemplate::new(200).set_body_json(nutritionix_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = NutritionixProvider::new(&nutritionix_config(&mock_server.uri()));
    let candidates = provider.search(&query()).await.into_candidates();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Brown Rice");
    assert_eq!(candidates[0].source_id, "brown rice");
    assert_eq!(candidates[0].source, provider.source());
    assert_eq!(candidates[0].serving_description, "2 cup");
    assert_eq!(candidates[0].serving_weight_g, 390.0);
    assert_eq!(candidates[0].calories, 433.2);
    Ok(())
}

#[tokio::test]
async fn test_nutritionix_error_status_is_a_failed_outcome() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/natural/nutrients"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid app key"))
        .mount(&mock_server)
        .await;

    let provider = NutritionixProvider::new(&nutritionix_config(&mock_server.uri()));
    match provider.search(&query()).await {
        ProviderOutcome::Failed(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(error_body, "invalid app key");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_open_food_facts_search() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("search_terms", RAW_QUERY))
        .and(query_param("json", "1"))
        .and(header("user-agent", "food_search-tests/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(off_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenFoodFactsProvider::new(&off_config(&mock_server.uri(), Duration::from_secs(5)));
    let candidates = provider.search(&query()).await.into_candidates();

    assert_eq!(candidates.len(), 1, "products without a name are skipped");
    assert_eq!(candidates[0].source, provider.source());
    assert_eq!(candidates[0].brand.as_deref(), Some("Uncle Ben's"));
    assert_eq!(candidates[0].calories, 160.0);
    assert_eq!(candidates[0].protein_g, 8.9);
    assert_eq!(candidates[0].serving_weight_g, 45.0);
    Ok(())
}

#[tokio::test]
async fn test_open_food_facts_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(off_body())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenFoodFactsProvider::new(&off_config(&mock_server.uri(), Duration::from_millis(100)));
    let outcome = provider.search(&query()).await;
    assert!(
        matches!(outcome, ProviderOutcome::Failed(ApiConnectionError::Timeout)),
        "unexpected outcome {outcome:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_a_failed_outcome() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let provider = UsdaProvider::new(&usda_config(&mock_server.uri(), Some("test-key")));
    let outcome = provider.search(&query()).await;
    assert!(matches!(
        outcome,
        ProviderOutcome::Failed(ApiConnectionError::SerializationError(_))
    ));
}

#[tokio::test]
async fn test_keyword_providers_receive_trimmed_raw_text() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("query", "the 2% milk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usda_body()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("search_terms", "the 2% milk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(off_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let padded = ProviderQuery {
        raw: "  the 2% milk ",
        page: 1,
        page_size: 20,
    };
    let usda = UsdaProvider::new(&usda_config(&uri, Some("test-key")));
    let off = OpenFoodFactsProvider::new(&off_config(&uri, Duration::from_secs(5)));
    assert_eq!(usda.search(&padded).await.into_candidates().len(), 1);
    assert_eq!(off.search(&padded).await.into_candidates().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_full_search_merges_providers_in_fixed_order() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/natural/nutrients"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(nutritionix_body())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(off_body()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usda_body()))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let config = SearchConfig {
        usda: usda_config(&uri, Some("test-key")),
        nutritionix: nutritionix_config(&uri),
        open_food_facts: off_config(&uri, Duration::from_secs(5)),
        ..SearchConfig::default()
    };
    let search = FoodSearch::from_config(Arc::new(MemoryFoodStore::new(Vec::new())), &config);

    let results = search.search_foods(RAW_QUERY, 1, 20).await?;
    let sources: Vec<FoodSource> = results.iter().map(|c| c.source).collect();
    assert_eq!(
        sources,
        vec![FoodSource::NlpProvider, FoodSource::CrowdDb, FoodSource::GovernmentDb]
    );
    Ok(())
}
