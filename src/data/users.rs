use super::store::Dataset;
use crate::error::Error;
use crate::error::Result;
use std::collections::HashMap;

/// one personalization record:
/// `uid tid lpu pu_1..pu_lpu lcu cu_1..cu_lcu ru_1..ru_lcu`
/// where cu lists candidate global rows and ru their relevance weights
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub uid: u64,
    pub tid: u64,
    pub pu: Vec<f64>,
    pub cu: Vec<u64>,
    pub ru: Vec<f64>,
}

impl UserRecord {
    pub fn load(lines: impl IntoIterator<Item = String>) -> Result<Vec<Self>> {
        lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Self::parse(&line))
            .collect()
    }

    fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace().map(|t| {
            t.parse::<f64>()
                .map_err(|_| Error::InputMalformed(format!("unparseable user field {:?}", t)))
        });
        let mut next = |field: &str| {
            tokens
                .next()
                .unwrap_or_else(|| Err(Error::InputMalformed(format!("user line missing {}", field))))
        };
        let uid = next("uid")? as u64;
        let tid = next("tid")? as u64;
        let lpu = next("lpu")? as usize;
        let pu = (0..lpu).map(|_| next("pu")).collect::<Result<Vec<_>>>()?;
        let lcu = next("lcu")? as usize;
        let cu = (0..lcu)
            .map(|_| next("cu").map(|v| v as u64))
            .collect::<Result<Vec<_>>>()?;
        let ru = (0..lcu).map(|_| next("ru")).collect::<Result<Vec<_>>>()?;
        Ok(Self { uid, tid, pu, cu, ru })
    }

    /// relevance weights aligned with a store's local row order, looked up
    /// through each local row's global index
    pub fn project(&self, data: &impl Dataset) -> Result<Vec<f64>> {
        let by_global = self
            .cu
            .iter()
            .zip(self.ru.iter())
            .map(|(c, r)| (*c as usize, *r))
            .collect::<HashMap<_, _>>();
        (0..data.len())
            .map(|local| {
                let global = data.global_index(local);
                by_global.get(&global).copied().ok_or_else(|| {
                    Error::InputMalformed(format!(
                        "user {} has no relevance weight for row {}",
                        self.uid, global
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row::Row;
    use crate::data::store::FullyLoaded;

    #[test]
    fn parses_variable_length_records() {
        let line = "3 1 2 0.5 0.25 3 0 1 2 0.9 0.8 0.7".to_string();
        let users = UserRecord::load([line]).expect("load");
        assert_eq!(users.len(), 1);
        let user = &users[0];
        assert_eq!(user.uid, 3);
        assert_eq!(user.tid, 1);
        assert_eq!(user.pu, vec![0.5, 0.25]);
        assert_eq!(user.cu, vec![0, 1, 2]);
        assert_eq!(user.ru, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn projects_weights_through_global_indices() {
        let user = UserRecord::load(["1 1 0 2 0 1 0.4 0.6".to_string()])
            .expect("load")
            .remove(0);
        let data =
            FullyLoaded::new(vec![Row::dense(vec![1.0]), Row::dense(vec![2.0])]).expect("data");
        assert_eq!(user.project(&data).expect("project"), vec![0.4, 0.6]);
    }

    #[test]
    fn missing_weight_is_malformed() {
        let user = UserRecord::load(["1 1 0 1 5 0.4".to_string()])
            .expect("load")
            .remove(0);
        let data = FullyLoaded::new(vec![Row::dense(vec![1.0])]).expect("data");
        assert!(user.project(&data).is_err());
    }
}
