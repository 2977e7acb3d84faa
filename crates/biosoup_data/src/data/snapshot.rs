use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::validation::validators::DefaultValidator;
use rkyv::{AlignedVec, Archive, CheckBytes, Deserialize, Serialize};

/// Encodes a value as a validated rkyv archive.
pub fn to_snapshot<T>(data: &T) -> anyhow::Result<Vec<u8>>
where
    T: Serialize<AllocSerializer<1024>>,
{
    let mut serializer = AllocSerializer::<1024>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| anyhow::anyhow!("Rkyv serialization error: {:?}", e))?;
    Ok(serializer.into_serializer().into_inner().to_vec())
}

/// Validates and decodes an archive produced by [`to_snapshot`].
pub fn from_snapshot<T>(bytes: &[u8]) -> anyhow::Result<T>
where
    T: Archive,
    T::Archived: Deserialize<T, SharedDeserializeMap> + for<'a> CheckBytes<DefaultValidator<'a>>,
{
    // Archives need their natural alignment.
    let mut aligned = AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    let archived = rkyv::check_archived_root::<T>(&aligned)
        .map_err(|e| anyhow::anyhow!("Rkyv validation error: {:?}", e))?;
    let mut deserializer = SharedDeserializeMap::default();
    let value: T = archived
        .deserialize(&mut deserializer)
        .map_err(|e| anyhow::anyhow!("Rkyv deserialization error: {:?}", e))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::genome::{Activation, Genome, LinkGene, NodeGene, NodeRole};

    #[test]
    fn test_genome_snapshot_roundtrip() {
        let mut g = Genome::new(3);
        g.generation = 4;
        g.insert_node(NodeGene {
            id: 0,
            role: NodeRole::Bias,
            activation: Activation::Linear,
        });
        g.insert_node(NodeGene {
            id: 1,
            role: NodeRole::Output,
            activation: Activation::Sigmoid,
        });
        g.genes.push(LinkGene {
            innovation: 1001,
            from: 0,
            to: 1,
            weight: -1.25,
            enabled: false,
            recurrent: false,
        });
        let bytes = to_snapshot(&g).expect("encode");
        let back: Genome = from_snapshot(&bytes).expect("decode");
        assert_eq!(back, g);
    }

    #[test]
    fn test_corrupt_snapshot_is_rejected() {
        let result: anyhow::Result<Genome> = from_snapshot(&[1, 2, 3]);
        assert!(result.is_err());
    }
}
