use std::{collections::BTreeMap, path::Path};

use hifitime::Epoch;

use crate::{
    document::{OutputDocument, CEP, LAT, LATITUDE, LON, LONGITUDE, TIME, VARIABLES},
    errors::Error,
    metadata::{AttributeSet, AttributeValue, Attributes},
    sample::PositionSample,
};

fn attribute_value(name: &str, value: netcdf::AttributeValue) -> Result<AttributeValue, Error> {
    match value {
        netcdf::AttributeValue::Str(s) => Ok(AttributeValue::Text(s)),
        netcdf::AttributeValue::Double(v) => Ok(AttributeValue::Double(v)),
        netcdf::AttributeValue::Float(v) => Ok(AttributeValue::Double(v as f64)),
        netcdf::AttributeValue::Int(v) => Ok(AttributeValue::Int(v)),
        netcdf::AttributeValue::Short(v) => Ok(AttributeValue::Int(v as i32)),
        other => Err(Error::Encoding(format!(
            "attribute \"{}\": unsupported type {:?}",
            name, other
        ))),
    }
}

fn read_attributes<'a, I>(attributes: I) -> Result<Attributes, Error>
where
    I: Iterator<Item = netcdf::Attribute<'a>>,
{
    let mut list = Attributes::default();
    for attribute in attributes {
        let name = attribute.name().to_string();
        let value = attribute
            .value()
            .map_err(|e| Error::Encoding(format!("attribute \"{}\": {}", name, e)))?;
        list.insert(&name, attribute_value(&name, value)?);
    }
    Ok(list)
}

fn column<'a>(series: &'a BTreeMap<&str, Vec<f64>>, name: &str) -> Result<&'a [f64], Error> {
    series
        .get(name)
        .map(|values| values.as_slice())
        .ok_or_else(|| Error::Encoding(format!("missing variable \"{}\"", name)))
}

impl OutputDocument {
    /// Reads an [OutputDocument] back from a netCDF file.
    /// The content is validated exactly like a document about to be written,
    /// so an incomplete or placeholder attribute fails the parsing.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let read_err = |e: netcdf::Error| Error::Encoding(format!("{}: {}", path.display(), e));

        let file = netcdf::open(path).map_err(read_err)?;

        let size = file
            .dimension(TIME)
            .map(|dim| dim.len())
            .ok_or_else(|| Error::Encoding(format!("{}: no time dimension", path.display())))?;

        let global = read_attributes(file.attributes())?;

        let mut variables = BTreeMap::new();
        let mut series = BTreeMap::<&str, Vec<f64>>::new();

        for name in VARIABLES {
            let var = file.variable(name).ok_or_else(|| {
                Error::Encoding(format!("{}: missing variable \"{}\"", path.display(), name))
            })?;

            variables.insert(name.to_string(), read_attributes(var.attributes())?);

            let values = var.get_values::<f64, _>(..).map_err(read_err)?;
            series.insert(name, values);
        }

        let (times, lats, lons, ceps) = (
            column(&series, TIME)?,
            column(&series, LATITUDE)?,
            column(&series, LONGITUDE)?,
            column(&series, CEP)?,
        );

        if [times.len(), lats.len(), lons.len(), ceps.len()]
            .iter()
            .any(|len| *len != size)
        {
            return Err(Error::Encoding(format!(
                "{}: variables do not match the time dimension ({})",
                path.display(),
                size
            )));
        }

        let samples = (0..size)
            .map(|i| PositionSample {
                epoch: Epoch::from_unix_seconds(times[i]),
                latitude: lats[i],
                longitude: lons[i],
                cep: ceps[i],
            })
            .collect::<Vec<_>>();

        let latitude = column(&series, LAT)?.first().copied();
        let longitude = column(&series, LON)?.first().copied();

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Self::from_parts(
                samples,
                latitude,
                longitude,
                AttributeSet { global, variables },
            ),
            _ => Err(Error::Encoding(format!(
                "{}: station coordinate is not defined",
                path.display()
            ))),
        }
    }
}
