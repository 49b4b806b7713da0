//! Document generation over realistic routers.

use http::Method;
use portico_core::{
    authenticator_fn, ApiError, AuthenticationError, ConfigurationError, Constraints, Credentials,
    EndpointBuilder, FieldSpec, Model, ParameterDescriptor, Router, SchemaCache, SecurityRequirement,
    SecurityScheme, TypeSpec,
};
use portico_docs::{DocsError, OpenApiGenerator, ParameterIn, HTTP_VALIDATION_ERROR};
use serde_json::json;

struct Address;

impl Model for Address {
    const NAME: &'static str = "Address";

    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::of::<String>("street"), FieldSpec::of::<String>("city")]
    }
}

struct Order;

impl Model for Order {
    const NAME: &'static str = "Order";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::of::<i64>("id"),
            FieldSpec::new("ship_to", TypeSpec::model::<Address>()).alias("shipTo"),
            FieldSpec::new("bill_to", TypeSpec::optional(TypeSpec::model::<Address>())).optional(),
        ]
    }
}

struct Paging;

impl Model for Paging {
    const NAME: &'static str = "Paging";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::of::<i64>("limit")
                .default(json!(10))
                .constraints(Constraints::new().minimum(1.0)),
            FieldSpec::of::<Vec<String>>("sort").alias("sortBy").default(json!([])),
        ]
    }
}

mod other {
    use portico_core::{FieldSpec, Model};

    pub struct Address;

    impl Model for Address {
        const NAME: &'static str = "Address";

        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::of::<String>("line")]
        }
    }
}

fn orders_router() -> Router {
    let mut router = Router::new().tag("orders");
    router
        .add(
            EndpointBuilder::get("/orders")
                .param(ParameterDescriptor::query("paging", TypeSpec::model::<Paging>()))
                .returns(TypeSpec::array(TypeSpec::model::<Order>()))
                .handler_sync(|_| Ok::<_, ApiError>(Vec::<i64>::new())),
        )
        .unwrap();
    router
        .add(
            EndpointBuilder::post("/orders")
                .param(ParameterDescriptor::body("order", TypeSpec::model::<Order>()))
                .returns(TypeSpec::model::<Order>())
                .status(201)
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();
    router
        .add(
            EndpointBuilder::get("/addresses/{id}")
                .param(ParameterDescriptor::path("id", TypeSpec::Integer))
                .returns(TypeSpec::model::<Address>())
                .tag("addresses")
                .deprecated()
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();
    router
}

#[test]
fn test_generation_is_deterministic() {
    let router = orders_router();
    let generator = OpenApiGenerator::new().title("Orders").version("2.0.0");

    let first = generator.generate_json(router.endpoints(), &SchemaCache::new()).unwrap();
    let second = generator.generate_json(router.endpoints(), &SchemaCache::new()).unwrap();
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["openapi"], "3.1.0");
    assert_eq!(value["info"], json!({"title": "Orders", "version": "2.0.0"}));
}

#[test]
fn test_each_model_is_one_component() {
    let router = orders_router();
    let cache = SchemaCache::new();
    let doc = OpenApiGenerator::new().generate(router.endpoints(), &cache).unwrap();

    let names: Vec<&str> = doc
        .components
        .as_ref()
        .unwrap()
        .schemas
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["Address", HTTP_VALIDATION_ERROR, "Order", "ValidationError"]);

    let computed = cache.computations();
    let again = OpenApiGenerator::new().generate(router.endpoints(), &cache).unwrap();
    assert_eq!(cache.computations(), computed);
    assert_eq!(again, doc);

    let order = serde_json::to_value(doc.component("Order").unwrap()).unwrap();
    assert_eq!(order["properties"]["shipTo"], json!({"$ref": "#/components/schemas/Address"}));
    assert_eq!(order["required"], json!(["id", "shipTo"]));
}

#[test]
fn test_query_model_is_flattened() {
    let router = orders_router();
    let doc = OpenApiGenerator::new()
        .generate(router.endpoints(), &SchemaCache::new())
        .unwrap();
    let op = doc.operation(&Method::GET, "/orders").unwrap();

    let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["limit", "sortBy"]);
    assert!(op.parameters.iter().all(|p| p.location == ParameterIn::Query));
    assert!(op.parameters.iter().all(|p| !p.required));
    assert_eq!(op.parameters[0].schema.default, Some(json!(10)));
    assert_eq!(op.parameters[0].schema.minimum, Some(1.0));
}

#[test]
fn test_operations_carry_status_tags_and_deprecation() {
    let router = orders_router();
    let doc = OpenApiGenerator::new()
        .tag_description("orders", "Order management")
        .generate(router.endpoints(), &SchemaCache::new())
        .unwrap();

    let create = doc.operation(&Method::POST, "/orders").unwrap();
    assert_eq!(create.operation_id, "post_orders");
    assert!(create.responses.contains_key("201"));
    assert!(create.responses.contains_key("422"));

    let address = doc.operation(&Method::GET, "/addresses/{id}").unwrap();
    assert!(address.deprecated);
    assert_eq!(address.tags, vec!["orders", "addresses"]);
    assert_eq!(address.parameters[0].location, ParameterIn::Path);
    assert!(address.parameters[0].required);

    let tags = serde_json::to_value(&doc.tags).unwrap();
    assert_eq!(
        tags,
        json!([{"name": "orders", "description": "Order management"}, {"name": "addresses"}])
    );
}

#[test]
fn test_schema_name_collision() {
    let mut router = Router::new();
    router
        .add(
            EndpointBuilder::get("/a")
                .returns(TypeSpec::model::<Address>())
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();
    router
        .add(
            EndpointBuilder::get("/b")
                .returns(TypeSpec::model::<other::Address>())
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();

    let err = OpenApiGenerator::new()
        .generate(router.endpoints(), &SchemaCache::new())
        .unwrap_err();
    match err {
        DocsError::Configuration(ConfigurationError::SchemaNameCollision { name, .. }) => {
            assert_eq!(name, "Address");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_file_uploads_use_multipart() {
    let mut router = Router::new();
    router
        .add(
            EndpointBuilder::post("/uploads")
                .param(ParameterDescriptor::file("avatar"))
                .param(ParameterDescriptor::files("attachments").optional())
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();
    let doc = OpenApiGenerator::new()
        .generate(router.endpoints(), &SchemaCache::new())
        .unwrap();
    let value = serde_json::to_value(doc.operation(&Method::POST, "/uploads").unwrap()).unwrap();
    let form = &value["requestBody"]["content"]["multipart/form-data"]["schema"];
    assert_eq!(form["properties"]["avatar"], json!({"type": "string", "format": "binary"}));
    assert_eq!(form["properties"]["attachments"]["type"], "array");
    assert_eq!(form["required"], json!(["avatar"]));
}

#[test]
fn test_document_level_security() {
    let api_key = ParameterDescriptor::security(
        "client",
        "api_key",
        SecurityScheme::api_key_header("X-API-Key"),
        authenticator_fn(|_: Credentials| async {
            Ok::<_, AuthenticationError>("client".to_string())
        }),
    );

    let mut router = Router::new().with_security(vec![SecurityRequirement::new("bearer")]);
    router
        .add(EndpointBuilder::get("/private").handler_sync(|_| Ok::<_, ApiError>(())))
        .unwrap();
    router
        .add(
            EndpointBuilder::get("/public")
                .public()
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();
    router
        .add(
            EndpointBuilder::get("/partners")
                .param(api_key)
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();

    let doc = OpenApiGenerator::new()
        .security(SecurityRequirement::new("bearer"))
        .security_scheme("bearer", &SecurityScheme::bearer())
        .generate(router.endpoints(), &SchemaCache::new())
        .unwrap();
    let value = serde_json::to_value(&doc).unwrap();

    assert_eq!(value["security"], json!([{"bearer": []}]));
    assert!(value["paths"]["/private"]["get"].get("security").is_none());
    assert_eq!(value["paths"]["/public"]["get"]["security"], json!([]));
    assert_eq!(
        value["paths"]["/partners"]["get"]["security"],
        json!([{"bearer": []}, {"api_key": []}])
    );
    assert_eq!(
        value["components"]["securitySchemes"],
        json!({
            "bearer": {"type": "http", "scheme": "bearer"},
            "api_key": {"type": "apiKey", "in": "header", "name": "X-API-Key"}
        })
    );
    assert!(value["paths"]["/private"]["get"]["responses"].get("422").is_none());
}
