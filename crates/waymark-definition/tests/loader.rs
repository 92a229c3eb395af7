//! Loading contracts from disk.

use std::fs;

use http::Method;
use tempfile::TempDir;
use waymark_definition::{
    ContractError, Definition, DefinitionOptions, ParameterLocation, StatusKey,
};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

#[test]
fn test_load_yaml_fixture() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("petstore.yaml");
    fs::write(&path, PETSTORE).unwrap();

    let definition = Definition::load(&path).unwrap();
    assert_eq!(definition.title(), "Swagger Petstore");
    assert_eq!(definition.operations().len(), 5);

    let ids: Vec<_> = definition.operations().iter().map(|o| o.operation_id()).collect();
    assert_eq!(
        ids,
        vec!["listPets", "createPets", "listMyPets", "showPetById", "deletePet"]
    );
}

#[test]
fn test_fixture_operations() {
    let definition = Definition::from_yaml_str(PETSTORE).unwrap();

    let list = definition.operation("listPets").unwrap();
    assert_eq!(list.summary(), Some("List all pets"));
    assert_eq!(list.tags(), ["pets".to_string()]);
    assert_eq!(list.query_parameters().count(), 2);
    let headers: Vec<_> = list.header_parameters().map(|p| p.name()).collect();
    assert_eq!(headers, vec!["X-Request-Id"]);

    let show = definition.operation("showPetById").unwrap();
    let path_param = show.parameters_in(ParameterLocation::Path).next().unwrap();
    assert_eq!(path_param.name(), "petId");
    assert!(path_param.required());
    assert_eq!(show.responses().lookup(200).unwrap().0, StatusKey::Class(2));
    assert!(show.responses().lookup(404).is_none());

    let delete = definition.operation("deletePet").unwrap();
    assert!(delete.deprecated());
    assert_eq!(delete.path_parameters().count(), 1);
}

#[test]
fn test_fixture_routing() {
    let definition = Definition::from_yaml_str(PETSTORE).unwrap();

    let mine = definition.find_operation(&Method::GET, "/pets/mine").unwrap();
    assert_eq!(mine.operation_id(), "listMyPets");

    let show = definition.find_operation(&Method::GET, "/pets/7").unwrap();
    assert_eq!(show.operation_id(), "showPetById");

    // The literal template wins the path even though it lacks DELETE.
    assert!(definition.find_operation(&Method::DELETE, "/pets/mine").is_none());
    let delete = definition.find_operation(&Method::DELETE, "/pets/7").unwrap();
    assert_eq!(delete.operation_id(), "deletePet");
}

#[test]
fn test_load_json_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contract.JSON");
    fs::write(
        &path,
        r#"{"openapi":"3.1.0","info":{"title":"Json","version":"1"},"paths":{"/a":{"get":{"operationId":"a"}}}}"#,
    )
    .unwrap();

    let definition = Definition::load(&path).unwrap();
    assert_eq!(definition.title(), "Json");
    assert!(definition.operation("a").is_some());
}

#[test]
fn test_load_with_filter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("petstore.yml");
    fs::write(&path, PETSTORE).unwrap();

    let definition = DefinitionOptions::new()
        .only(|template| template.starts_with("/pets/{"))
        .load(&path)
        .unwrap();
    assert_eq!(definition.operations().len(), 2);
    assert!(definition.find_operation(&Method::GET, "/pets").is_none());
}

#[test]
fn test_load_reports_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "openapi: [3.0").unwrap();

    assert!(matches!(
        Definition::load(&path),
        Err(ContractError::Parse { format: "yaml", .. })
    ));
}
