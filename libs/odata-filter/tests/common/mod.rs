#![allow(dead_code)]

use std::sync::Arc;

use odata_csdl::{SchemaModel, parse_csdl};
use odata_filter::{
    FilterPipeline, FunctionCatalog, FunctionMapping, PropertyMap, PropertyMapping,
    WildcardPosition,
};

pub const PRODUCTS_CSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version="4.0"
     xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx"
     xmlns="http://docs.oasis-open.org/odata/ns/edm">
  <edmx:DataServices>
    <Schema Namespace="ODataDemo">
      <EntityContainer Name="DefaultContainer">
        <EntitySet Name="Products" EntityType="ODataDemo.Product" />
        <EntitySet Name="Flubbers" EntityType="ODataDemo.Flubber" />
        <EntitySet Name="Orphans" EntityType="ODataDemo.Missing" />
      </EntityContainer>
      <EntityType Name="Flubber">
        <Key>
          <PropertyRef Name="ID" />
        </Key>
        <Property Name="ID" Type="Edm.Int32" Nullable="false" />
      </EntityType>
      <EntityType Name="Product">
        <Key>
          <PropertyRef Name="ID" />
        </Key>
        <Property Name="ID" Type="Edm.Int32" Nullable="false" />
        <Property Name="Name" Type="Edm.String" />
        <Property Name="Description" Type="Edm.String" />
        <Property Name="Price" Type="Edm.Double" />
        <Property Name="Released" Type="Edm.DateTimeOffset" />
        <Property Name="Location" Type="Edm.GeographyPoint" />
        <Property Name="Token" Type="Edm.Guid" />
        <Property Name="Quantity" Type="Edm.Int16" />
        <Property Name="Day" Type="Edm.Date" />
        <Property Name="Address" Type="ODataDemo.Address" />
      </EntityType>
      <ComplexType Name="Address">
        <Property Name="Street" Type="Edm.String" />
        <Property Name="City" Type="Edm.String" />
      </ComplexType>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

pub fn schema() -> SchemaModel {
    parse_csdl(PRODUCTS_CSDL).unwrap()
}

pub fn functions() -> FunctionCatalog {
    [
        FunctionMapping::new("startswith", "ILIKE({0}, {1})", "Edm.String")
            .with_arguments(["Edm.String", "Edm.String"])
            .with_wildcard(WildcardPosition::Right, "%"),
        FunctionMapping::new("endswith", "ILIKE({0}, {1})", "Edm.String")
            .with_arguments(["Edm.String", "Edm.String"])
            .with_wildcard(WildcardPosition::Left, "%"),
        FunctionMapping::new("contains", "ILIKE({0}, {1})", "Edm.String")
            .with_arguments(["Edm.String", "Edm.String"])
            .with_wildcard(WildcardPosition::Both, "%"),
        FunctionMapping::new("now", "NOW()", "Edm.DateTimeOffset"),
        FunctionMapping::new("tolower", "LOWER({0})", "Edm.String").with_arguments(["Edm.String"]),
        FunctionMapping::new("intersects", "ST_Intersects({0}, ST_GeomFromText({1}, @srid))", "Edm.Boolean")
            .with_arguments(["Edm.Geography", "Edm.Geography"]),
        FunctionMapping::new(
            "distance",
            "ST_Distance({0}, ST_GeomFromText({2}, @srid))",
            "Edm.Double",
        )
        .with_arguments(["Edm.Geography", "Edm.String", "Edm.Geography"]),
    ]
    .into_iter()
    .collect()
}

pub fn properties() -> PropertyMap {
    [
        PropertyMapping::new("Name", "name", "Edm.String"),
        PropertyMapping::new("Price", "price", "Edm.Double"),
        PropertyMapping::new("ID", "id", "Edm.Int32"),
        PropertyMapping::new("Released", "released_at", "Edm.DateTimeOffset"),
        PropertyMapping::new("Location", "location", "Edm.GeographyPoint"),
        PropertyMapping::new("Token", "token", "Edm.Guid"),
        PropertyMapping::new("Quantity", "quantity", "Edm.Int16"),
        PropertyMapping::new("Day", "day", "Edm.Date"),
        PropertyMapping::new("Address/Street", "street", "Edm.String"),
    ]
    .into_iter()
    .collect()
}

pub fn pipeline() -> FilterPipeline {
    FilterPipeline::new(Arc::new(schema()), functions(), properties())
}
