use crate::domain::radar::Nation;
use crate::ranking::RawModel;

/// (name, brand, typical monthly volume)
type SampleModel = (&'static str, &'static str, f64);

const DOMESTIC: &[SampleModel] = &[
    ("그랜저", "현대", 8500.0),
    ("아반떼", "현대", 7200.0),
    ("쏘나타", "현대", 4800.0),
    ("투싼", "현대", 5600.0),
    ("팰리세이드", "현대", 4200.0),
    ("싼타페", "현대", 6800.0),
    ("코나", "현대", 3900.0),
    ("캐스퍼", "현대", 4500.0),
    ("스타리아", "현대", 3200.0),
    ("아이오닉 5", "현대", 3800.0),
    ("아이오닉 6", "현대", 2100.0),
    ("쏘렌토", "기아", 7800.0),
    ("K5", "기아", 4600.0),
    ("K8", "기아", 3500.0),
    ("스포티지", "기아", 6200.0),
    ("셀토스", "기아", 4100.0),
    ("모닝", "기아", 2800.0),
    ("레이", "기아", 3300.0),
    ("카니발", "기아", 5500.0),
    ("EV6", "기아", 2600.0),
    ("EV9", "기아", 1800.0),
    ("니로", "기아", 2400.0),
    ("G80", "제네시스", 2200.0),
    ("GV70", "제네시스", 2500.0),
    ("GV80", "제네시스", 2000.0),
    ("G90", "제네시스", 1200.0),
    ("GV60", "제네시스", 900.0),
    ("QM6", "르노코리아", 1800.0),
    ("트레일블레이저", "쉐보레", 2100.0),
    ("토레스", "KG모빌리티", 2800.0),
    ("티볼리", "KG모빌리티", 1600.0),
];

const EXPORT: &[SampleModel] = &[
    ("520d", "BMW", 1800.0),
    ("530i", "BMW", 1200.0),
    ("X3", "BMW", 1600.0),
    ("X5", "BMW", 900.0),
    ("3시리즈", "BMW", 2200.0),
    ("iX", "BMW", 450.0),
    ("E-Class", "Mercedes-Benz", 1900.0),
    ("S-Class", "Mercedes-Benz", 650.0),
    ("GLC", "Mercedes-Benz", 1700.0),
    ("GLE", "Mercedes-Benz", 800.0),
    ("EQE", "Mercedes-Benz", 380.0),
    ("A4", "Audi", 900.0),
    ("A6", "Audi", 1100.0),
    ("Q5", "Audi", 850.0),
    ("Q7", "Audi", 420.0),
    ("e-tron GT", "Audi", 220.0),
    ("Tiguan", "Volkswagen", 950.0),
    ("Golf", "Volkswagen", 580.0),
    ("Passat", "Volkswagen", 320.0),
    ("XC60", "Volvo", 1100.0),
    ("XC90", "Volvo", 650.0),
    ("ES300h", "Lexus", 1300.0),
    ("RX350", "Lexus", 900.0),
    ("NX350h", "Lexus", 700.0),
    ("RAV4", "Toyota", 1500.0),
    ("Camry", "Toyota", 800.0),
    ("Model 3", "Tesla", 1800.0),
    ("Model Y", "Tesla", 2400.0),
    ("Model X", "Tesla", 180.0),
    ("Cayenne", "Porsche", 480.0),
    ("Range Rover", "Land Rover", 350.0),
    ("Cooper", "MINI", 620.0),
];

/// Stand-in for an upstream sales feed: a fixed model list per nation.
pub fn sample_catalog(nation: Nation) -> Vec<RawModel> {
    let source = match nation {
        Nation::Domestic => DOMESTIC,
        Nation::Export => EXPORT,
    };

    source
        .iter()
        .map(|(name, brand, base)| RawModel::new(*name, *brand, *base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalogs_are_non_empty_and_unique() {
        for nation in Nation::ALL {
            let models = sample_catalog(nation);
            assert!(!models.is_empty());

            let names: HashSet<_> = models.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names.len(), models.len(), "duplicate names for {nation}");
            assert!(models.iter().all(|m| m.base_volume > 0.0));
        }
    }
}
